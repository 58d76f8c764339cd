//! Verb argument validation.

use crate::formats::FormatRegistry;
use crate::protocol::{DateArg, ErrorCode, ProtocolError};
use crate::request::Arguments;

/// Check `args` against a verb's argument contract.
///
/// Every check runs; all problems found are returned together. `verb` is
/// always allowed and never reported.
pub fn validate(
    args: &Arguments,
    required: &[&str],
    optional: &[&str],
    formats: &FormatRegistry,
) -> Vec<ProtocolError> {
    let mut errors = Vec::new();

    if args.has_duplicates() {
        errors.push(ProtocolError::bad_argument("Duplicate arguments"));
    }

    for key in required {
        if args.get(key).map_or(true, str::is_empty) {
            errors.push(ProtocolError::bad_argument(format!(
                "Missing required argument {key}"
            )));
        }
    }

    for key in args.keys() {
        if key != "verb" && !required.contains(&key) && !optional.contains(&key) {
            errors.push(ProtocolError::bad_argument(format!("Unknown argument {key}")));
        }
    }

    let from = check_date(args, "from", &mut errors);
    let until = check_date(args, "until", &mut errors);
    if let (Some(from), Some(until)) = (from, until) {
        if from.granularity() != until.granularity() {
            errors.push(ProtocolError::bad_argument(
                "Date arguments from and until have differing granularity",
            ));
        } else if from.start() > until.start() {
            errors.push(ProtocolError::bad_argument(
                "Date argument from is later than until",
            ));
        }
    }

    if let Some(prefix) = args.get("metadataPrefix").filter(|p| !p.is_empty()) {
        if formats.get(prefix).is_none() {
            errors.push(ProtocolError::new(
                ErrorCode::CannotDisseminateFormat,
                format!("Format {prefix} is not supported by this repository"),
            ));
        }
    }

    errors
}

fn check_date(args: &Arguments, key: &str, errors: &mut Vec<ProtocolError>) -> Option<DateArg> {
    let raw = args.get(key)?;
    let parsed = DateArg::parse(raw);
    if parsed.is_none() {
        errors.push(ProtocolError::bad_argument(format!(
            "Date argument {key} must be YYYY-MM-DD or YYYY-MM-DDThh:mm:ssZ, got '{raw}'"
        )));
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Verb;
    use pretty_assertions::assert_eq;

    fn formats() -> FormatRegistry {
        FormatRegistry::with_builtin_formats(vec!["oai_dc".to_string()])
    }

    fn run(verb: Verb, query: &str) -> Vec<ProtocolError> {
        let (required, optional) = verb.contract();
        validate(&Arguments::parse(query), required, optional, &formats())
    }

    fn messages(errors: &[ProtocolError]) -> Vec<&str> {
        errors.iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn test_valid_list_arguments() {
        let errors = run(
            Verb::ListRecords,
            "verb=ListRecords&metadataPrefix=oai_dc&from=2024-01-01&until=2024-02-01&set=7",
        );
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_errors_accumulate() {
        let errors = run(Verb::GetRecord, "verb=GetRecord&verb=GetRecord&foo=1&bar=2");
        assert_eq!(
            messages(&errors),
            vec![
                "Duplicate arguments",
                "Missing required argument identifier",
                "Missing required argument metadataPrefix",
                "Unknown argument foo",
                "Unknown argument bar",
            ]
        );
        assert!(errors.iter().all(|e| e.code == ErrorCode::BadArgument));
    }

    #[test]
    fn test_empty_required_value_counts_as_missing() {
        let errors = run(Verb::ListIdentifiers, "verb=ListIdentifiers&metadataPrefix=");
        assert_eq!(messages(&errors), vec!["Missing required argument metadataPrefix"]);
    }

    #[test]
    fn test_differing_granularity() {
        let errors = run(
            Verb::ListIdentifiers,
            "verb=ListIdentifiers&metadataPrefix=oai_dc&from=2024-01-01&until=2024-01-02T00:00:00Z",
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::BadArgument);
        assert!(errors[0].message.contains("differing granularity"));
    }

    #[test]
    fn test_malformed_dates_reported_separately() {
        let errors = run(
            Verb::ListRecords,
            "verb=ListRecords&metadataPrefix=oai_dc&from=yesterday&until=2024-13-01",
        );
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_from_after_until() {
        let errors = run(
            Verb::ListRecords,
            "verb=ListRecords&metadataPrefix=oai_dc&from=2024-02-01&until=2024-01-01",
        );
        assert_eq!(messages(&errors), vec!["Date argument from is later than until"]);
    }

    #[test]
    fn test_registered_but_disabled_format() {
        let errors = run(Verb::ListRecords, "verb=ListRecords&metadataPrefix=oai_dcterms");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::CannotDisseminateFormat);
    }

    #[test]
    fn test_format_error_accumulates_with_argument_errors() {
        let errors = run(Verb::ListRecords, "verb=ListRecords&metadataPrefix=mods&extra=1");
        let codes: Vec<ErrorCode> = errors.iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            vec![ErrorCode::BadArgument, ErrorCode::CannotDisseminateFormat]
        );
    }
}
