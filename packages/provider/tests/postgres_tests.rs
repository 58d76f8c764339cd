mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;

use common::{day, resumption_token, TestDb};
use oaipmh_provider::models::{RecordFilter, SetHandle};
use oaipmh_provider::protocol::{DateArg, DateRange};
use oaipmh_provider::token::NewToken;
use oaipmh_provider::{
    OaiRequest, PgRecordSource, PgTokenStore, Record, RecordSource, Repository, TokenStore, Verb,
};

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_token_round_trip() {
    let db = TestDb::new().await;
    let store = PgTokenStore::new(db.pool.clone());

    let token = NewToken::new(Verb::ListRecords, "oai_dc", 50)
        .with_set(Some("7".into()))
        .with_dates(Some("2024-01-01".into()), Some("2024-02-01T00:00:00Z".into()));
    let created = store.create(token, Duration::minutes(10)).await.unwrap();

    let resolved = store.resolve(&created.id).await.unwrap().unwrap();
    assert_eq!(resolved.verb, Verb::ListRecords);
    assert_eq!(resolved.metadata_prefix, "oai_dc");
    assert_eq!(resolved.cursor, 50);
    assert_eq!(resolved.set.as_deref(), Some("7"));
    assert_eq!(resolved.from.as_deref(), Some("2024-01-01"));
    assert_eq!(resolved.until.as_deref(), Some("2024-02-01T00:00:00Z"));
    assert!(resolved.is_valid_for(Verb::ListRecords, Utc::now()));

    assert!(store.resolve("missing").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_purge_removes_only_expired_tokens() {
    let db = TestDb::new().await;
    let store = PgTokenStore::new(db.pool.clone());

    let live = store
        .create(
            NewToken::new(Verb::ListIdentifiers, "oai_dc", 10),
            Duration::minutes(10),
        )
        .await
        .unwrap();
    let dead = store
        .create(
            NewToken::new(Verb::ListIdentifiers, "oai_dc", 20),
            Duration::minutes(-1),
        )
        .await
        .unwrap();

    assert_eq!(store.purge_expired().await.unwrap(), 1);
    assert!(store.resolve(&live.id).await.unwrap().is_some());
    assert!(store.resolve(&dead.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_corrupt_token_row() {
    let db = TestDb::new().await;
    let store = PgTokenStore::new(db.pool.clone());

    sqlx::query(
        "INSERT INTO resumption_tokens (id, verb, metadata_prefix, page_cursor, expiration) \
         VALUES ('bad', 'Harvest', 'oai_dc', 0, now() + interval '1 hour')",
    )
    .execute(&db.pool)
    .await
    .unwrap();

    assert!(store.resolve("bad").await.is_err());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_record_queries() {
    let db = TestDb::new().await;
    let source = PgRecordSource::new(db.pool.clone());

    for id in 1..=4 {
        let mut record = Record::new(id, day(id as u32))
            .with_value("dcterms:type", if id % 2 == 0 { "map" } else { "photo" });
        if id == 4 {
            record = record.private();
        }
        if id <= 2 {
            record = record.with_collection(10);
        }
        source.upsert(&record).await.unwrap();
    }

    let all = source
        .query(&RecordFilter::default(), 0, 10)
        .await
        .unwrap();
    assert_eq!(all.total, 3);
    assert_eq!(
        all.rows.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let page = source
        .query(&RecordFilter::default(), 1, 1)
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.rows[0].id, 2);

    let in_collection = RecordFilter {
        set: Some(SetHandle::Collection(10)),
        ..RecordFilter::default()
    };
    assert_eq!(source.query(&in_collection, 0, 10).await.unwrap().total, 2);

    let maps = RecordFilter {
        set: Some(SetHandle::Query {
            term: "dcterms:type".into(),
            value: "map".into(),
        }),
        ..RecordFilter::default()
    };
    let found = source.query(&maps, 0, 10).await.unwrap();
    assert_eq!(found.rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2]);

    let dated = RecordFilter {
        dates: DateRange::new(DateArg::parse("2024-03-02"), DateArg::parse("2024-03-02")),
        ..RecordFilter::default()
    };
    let found = source.query(&dated, 0, 10).await.unwrap();
    assert_eq!(found.rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2]);

    let by_value = source.find_by_value("dcterms:type", "photo", None).await.unwrap();
    assert_eq!(by_value.map(|r| r.id), Some(1));
    let by_id = source.find_by_id(3).await.unwrap().unwrap();
    assert_eq!(by_id.first_value("dcterms:type"), Some("photo"));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_paging_against_postgres() {
    let db = TestDb::new().await;
    let source = Arc::new(PgRecordSource::new(db.pool.clone()));
    for id in 1..=3 {
        source.upsert(&Record::new(id, day(id as u32))).await.unwrap();
    }

    let repo = Repository::from_config(
        common::config().with_list_limit(2),
        source,
        Arc::new(PgTokenStore::new(db.pool.clone())),
    )
    .await
    .unwrap();

    let first = repo
        .handle(&OaiRequest::get("verb=ListIdentifiers&metadataPrefix=oai_dc"))
        .await
        .unwrap();
    let (token, _) = resumption_token(&first.body).unwrap();
    assert!(!token.is_empty());

    let second = repo
        .handle(&OaiRequest::get(&format!(
            "verb=ListIdentifiers&resumptionToken={token}"
        )))
        .await
        .unwrap();
    assert!(!second.is_error(), "{}", second.body);
    let (last, _) = resumption_token(&second.body).unwrap();
    assert_eq!(last, "");
}
