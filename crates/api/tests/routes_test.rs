//! HTTP route tests against the in-memory store.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use chrono::{NaiveDate, TimeZone, Utc};
use http_body_util::BodyExt;
use ledgerline_api::{AppState, create_router};
use ledgerline_core::clock::FixedClock;
use ledgerline_core::journal::{EntryNumbering, JournalService};
use ledgerline_core::ledger::{Account, AccountClass};
use ledgerline_core::period::{MonthlyPeriod, PeriodService};
use ledgerline_core::store::InMemoryStore;
use ledgerline_shared::types::{FiscalPeriodId, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    actor: UserId,
    cash: Account,
    capital: Account,
    sales: Account,
    retained: Account,
    january: MonthlyPeriod,
    february: MonthlyPeriod,
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn test_app() -> TestApp {
    let store = InMemoryStore::new();
    let cash = Account::new("1100", "Cash", AccountClass::Asset);
    let capital = Account::new("3100", "Share capital", AccountClass::Equity);
    let retained = Account::new("3200", "Retained earnings", AccountClass::Equity);
    let sales = Account::new("4100", "Sales", AccountClass::Revenue);
    for account in [&cash, &capital, &retained, &sales] {
        store.add_account(account.clone()).await;
    }

    let fiscal = FiscalPeriodId::new();
    let january = MonthlyPeriod::new(fiscal, "January 2026", date(2026, 1, 1), date(2026, 1, 31));
    let february = MonthlyPeriod::new(fiscal, "February 2026", date(2026, 2, 1), date(2026, 2, 28));
    store.add_period(january.clone()).await;
    store.add_period(february.clone()).await;

    let store = Arc::new(store);
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap(),
    ));
    let numbering = EntryNumbering::strict();
    let state = AppState {
        journal: JournalService::new(store.clone(), clock.clone(), numbering),
        periods: PeriodService::new(store, clock, numbering),
    };

    TestApp {
        router: create_router(state),
        actor: UserId::new(),
        cash,
        capital,
        sales,
        retained,
        january,
        february,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_as(method, uri, body, Some(&self.actor.to_string()))
            .await
    }

    async fn send_as(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        actor: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder.header("X-Actor-Id", actor);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn entry_body(&self, amount: &str) -> Value {
        json!({
            "entry_date": "2026-01-15",
            "description": "Capital injection",
            "monthly_period_id": self.january.id,
            "lines": [
                { "account_id": self.cash.id, "debit": amount },
                { "account_id": self.capital.id, "amount": amount, "side": "credit" }
            ]
        })
    }

    async fn create_entry(&self, amount: &str) -> Value {
        let (status, body) = self
            .send(Method::POST, "/api/v1/journal-entries", Some(self.entry_body(amount)))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = app.send_as(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_actor_header_required() {
    let app = test_app().await;
    let body = app.entry_body("100");

    let (status, json) = app
        .send_as(Method::POST, "/api/v1/journal-entries", Some(body.clone()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "MISSING_ACTOR");

    let (status, json) = app
        .send_as(Method::POST, "/api/v1/journal-entries", Some(body), Some("nobody"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "INVALID_ACTOR");
}

#[tokio::test]
async fn test_validate_reports_difference() {
    let app = test_app().await;
    let body = json!({
        "lines": [
            { "account_id": app.cash.id, "debit": "100.00" },
            { "account_id": app.capital.id, "credit": 90 }
        ]
    });

    let (status, json) = app
        .send(Method::POST, "/api/v1/journal-entries/validate", Some(body))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["valid"], false);
    assert_eq!(decimal(&json["difference"]), dec!(10));
    assert_eq!(decimal(&json["total_debit"]), dec!(100));
}

#[tokio::test]
async fn test_create_and_get_entry() {
    let app = test_app().await;
    let created = app.create_entry("250.50").await;
    assert_eq!(created["entry_number"], "1");
    assert_eq!(created["status"], "draft");
    assert_eq!(decimal(&created["total_credit"]), dec!(250.50));
    assert_eq!(created["lines"].as_array().unwrap().len(), 2);

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = app
        .send(Method::GET, &format!("/api/v1/journal-entries/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_numeric_amounts_are_stored_exactly() {
    let app = test_app().await;
    let body = json!({
        "entry_date": "2026-01-20",
        "description": "Float-looking amounts",
        "monthly_period_id": app.january.id,
        "lines": [
            { "account_id": app.cash.id, "debit": 0.1 },
            { "account_id": app.retained.id, "amount": 0.2, "side": "debit" },
            { "account_id": app.capital.id, "credit": 0.3 }
        ]
    });
    let (status, created) = app
        .send(Method::POST, "/api/v1/journal-entries", Some(body))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");

    let uri = format!("/api/v1/journal-entries/{}", created["id"].as_str().unwrap());
    let (_, fetched) = app.send(Method::GET, &uri, None).await;
    let amounts: Vec<Decimal> = fetched["lines"]
        .as_array()
        .unwrap()
        .iter()
        .map(|line| decimal(&line["amount"]))
        .collect();
    assert_eq!(amounts, vec![dec!(0.1), dec!(0.2), dec!(0.3)]);
    assert_eq!(decimal(&fetched["total_debit"]), dec!(0.3));
    assert_eq!(decimal(&fetched["total_credit"]), dec!(0.3));
    assert_eq!(fetched["is_balanced"], true);

    let body = json!({
        "entry_date": "2026-01-21",
        "description": "Sale",
        "monthly_period_id": app.january.id,
        "lines": [
            { "account_id": app.cash.id, "debit": 99.98 },
            { "account_id": app.sales.id, "credit": 99.98 }
        ]
    });
    let (status, created) = app
        .send(Method::POST, "/api/v1/journal-entries", Some(body))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");

    let uri = format!("/api/v1/journal-entries/{}", created["id"].as_str().unwrap());
    let (_, fetched) = app.send(Method::GET, &uri, None).await;
    assert_eq!(decimal(&fetched["lines"][0]["amount"]), dec!(99.98));
    assert_eq!(decimal(&fetched["lines"][1]["amount"]), dec!(99.98));
    assert_eq!(decimal(&fetched["total_debit"]), dec!(99.98));
    assert_eq!(decimal(&fetched["total_credit"]), dec!(99.98));
}

#[tokio::test]
async fn test_oversized_amounts_are_rejected_without_crashing() {
    let app = test_app().await;
    let huge = "79228162514264337593543950335";
    let lines = json!([
        { "account_id": app.cash.id, "debit": huge },
        { "account_id": app.retained.id, "debit": huge },
        { "account_id": app.capital.id, "credit": huge }
    ]);

    let (status, json) = app
        .send(
            Method::POST,
            "/api/v1/journal-entries/validate",
            Some(json!({ "lines": lines })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["valid"], false);

    let mut body = app.entry_body("1");
    body["lines"] = lines;
    let (status, json) = app
        .send(Method::POST, "/api/v1/journal-entries", Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "AMOUNT_TOO_LARGE");

    let (status, _) = app.send_as(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unbalanced_create_is_rejected() {
    let app = test_app().await;
    let mut body = app.entry_body("100");
    body["lines"][1]["amount"] = json!("80");

    let (status, json) = app
        .send(Method::POST, "/api/v1/journal-entries", Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "UNBALANCED");
    assert!(json["message"].as_str().is_some());
}

#[tokio::test]
async fn test_unknown_entry_is_not_found() {
    let app = test_app().await;
    let uri = format!("/api/v1/journal-entries/{}", uuid::Uuid::new_v4());
    let (status, json) = app.send(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "ENTRY_NOT_FOUND");
}

#[tokio::test]
async fn test_entry_lifecycle() {
    let app = test_app().await;
    let created = app.create_entry("100").await;
    let id = created["id"].as_str().unwrap().to_string();
    let base = format!("/api/v1/journal-entries/{id}");

    let (status, edited) = app
        .send(Method::PUT, &base, Some(app.entry_body("120")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["entry_number"], "1");
    assert_eq!(decimal(&edited["total_debit"]), dec!(120));

    let (status, submitted) = app.send(Method::POST, &format!("{base}/submit"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "pending");

    let (status, approved) = app.send(Method::POST, &format!("{base}/approve"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["approved_by"], json!(app.actor));

    let (status, json) = app
        .send(Method::PUT, &base, Some(app.entry_body("130")))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "IMMUTABLE_ENTRY");

    let (status, json) = app.send(Method::DELETE, &base, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "IMMUTABLE_ENTRY");
}

#[tokio::test]
async fn test_void_and_delete() {
    let app = test_app().await;
    let voided = app.create_entry("100").await;
    let void_uri = format!(
        "/api/v1/journal-entries/{}/void",
        voided["id"].as_str().unwrap()
    );

    let (status, json) = app
        .send(Method::POST, &void_uri, Some(json!({ "reason": "  " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "VOID_REASON_REQUIRED");

    let (status, json) = app
        .send(Method::POST, &void_uri, Some(json!({ "reason": "Duplicate" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "voided");
    assert_eq!(json["void_reason"], "Duplicate");

    let deleted = app.create_entry("40").await;
    let uri = format!("/api/v1/journal-entries/{}", deleted["id"].as_str().unwrap());
    let (status, _) = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_close_and_reopen_period() {
    let app = test_app().await;
    let january = app.january.id;
    let february = app.february.id;

    let sale = json!({
        "entry_date": "2026-01-20",
        "description": "Cash sale",
        "monthly_period_id": january,
        "lines": [
            { "account_id": app.cash.id, "debit": "75" },
            { "account_id": app.sales.id, "credit": "75" }
        ]
    });
    for body in [app.entry_body("500"), sale] {
        let (status, created) = app
            .send(Method::POST, "/api/v1/journal-entries", Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!(
            "/api/v1/journal-entries/{}/approve",
            created["id"].as_str().unwrap()
        );
        let (status, _) = app.send(Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let readiness_uri = format!("/api/v1/periods/{january}/reopen-readiness?target={february}");
    let (_, readiness) = app.send(Method::GET, &readiness_uri, None).await;
    assert_eq!(readiness["ready"], false);
    assert_eq!(readiness["error_code"], "SOURCE_NOT_CLOSED");

    let (status, closed) = app
        .send(Method::POST, &format!("/api/v1/periods/{january}/close"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["is_closed"], true);

    let (status, readiness) = app.send(Method::GET, &readiness_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
    assert_eq!(readiness["message"], "Ready");

    let reopen_uri = format!("/api/v1/periods/{january}/reopen");
    let body = json!({
        "target_period_id": february,
        "retained_earnings_account": app.retained.id
    });
    let (status, outcome) = app
        .send(Method::POST, &reopen_uri, Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{outcome}");
    assert_eq!(decimal(&outcome["total_assets"]), dec!(575));
    assert_eq!(decimal(&outcome["total_equity"]), dec!(575));
    assert_eq!(outcome["line_count"], 3);

    let opening_uri = format!(
        "/api/v1/journal-entries/{}",
        outcome["opening_entry_id"].as_str().unwrap()
    );
    let (_, opening) = app.send(Method::GET, &opening_uri, None).await;
    assert_eq!(opening["entry_date"], "2026-02-01");
    assert_eq!(opening["is_opening"], true);

    let (status, json) = app.send(Method::POST, &reopen_uri, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "ALREADY_REOPENED");
}

#[tokio::test]
async fn test_readiness_for_same_period() {
    let app = test_app().await;
    let january = app.january.id;
    let uri = format!("/api/v1/periods/{january}/reopen-readiness?target={january}");

    let (status, readiness) = app.send(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], false);
    assert_eq!(readiness["error_code"], "SAME_PERIOD");
}
