use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use crate::persistence::testing::TempDatabase;
use crate::services::{BloodBank, NewStaff};

pub(super) struct TestApp {
    pub(super) temp: TempDatabase,
    pub(super) bank: BloodBank,
    pub(super) router: Router,
}

/// Router over a fresh database; `with_phlebotomist` puts PHL001 on the roster.
pub(super) fn app(with_phlebotomist: bool) -> TestApp {
    let temp = TempDatabase::new();
    let bank = BloodBank::new(Arc::new(temp.database.clone()));
    if with_phlebotomist {
        let role_id = bank
            .staff
            .list_roles()
            .unwrap()
            .into_iter()
            .find(|role| role.role_name == "Phlebotomist")
            .unwrap()
            .role_id;
        bank.staff
            .create_staff(NewStaff {
                first_name: Some("Lena".to_string()),
                last_name: Some("Ortiz".to_string()),
                employee_number: Some("PHL001".to_string()),
                role_id: Some(role_id),
            })
            .unwrap();
    }
    let router = super::super::router(&bank);
    TestApp { temp, bank, router }
}

impl TestApp {
    pub(super) async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, _, bytes) = self.raw(method, uri, body.map(|json| json.to_string())).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub(super) async fn raw(
        &self,
        method: Method,
        uri: &str,
        body: Option<String>,
    ) -> (StatusCode, Option<String>, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(text) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(text))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, bytes.to_vec())
    }
}
