#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use axum::{
    Json, Router,
    body::{Body, Bytes, to_bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt; // for oneshot

use payportal::{
    config::PortalConfig,
    routes,
    state::{AppState, init_state},
};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const STUDENT_EMAIL: &str = "student@example.com";
pub const PASSWORD: &str = "secret";
pub const STUDENT_ID: i64 = 7;

/// Request seen by the fake backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub token: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone, Default)]
struct MockState {
    log: Arc<Mutex<Vec<Recorded>>>,
    revoked: Arc<AtomicBool>,
}

/// In-process stand-in for the payment REST API.
pub struct MockBackend {
    pub addr: SocketAddr,
    state: MockState,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend crashed");
        });
        MockBackend { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.log.lock().unwrap().clone()
    }

    pub fn find(&self, method: Method, path: &str) -> Option<Recorded> {
        self.requests()
            .into_iter()
            .find(|r| r.method == method && r.path == path)
    }

    /// Every bearer token is rejected from now on.
    pub fn revoke_tokens(&self) {
        self.state.revoked.store(true, Ordering::SeqCst);
    }
}

fn admin_user() -> Value {
    json!({
        "id": 1,
        "email": ADMIN_EMAIL,
        "first_name": "Ada",
        "last_name": "Admin",
        "role": "admin",
        "created_at": "2024-09-01T08:00:00.000Z"
    })
}

fn student_user() -> Value {
    json!({
        "id": STUDENT_ID,
        "email": STUDENT_EMAIL,
        "first_name": "Sam",
        "last_name": "Student",
        "role": "student",
        "created_at": "2024-09-01T08:00:00.000Z"
    })
}

fn plan(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "user_id": STUDENT_ID,
        "total_amount": "1200.00",
        "paid_amount": "0.00",
        "remaining_amount": "1200.00",
        "status": status,
        "type": "INSTALLMENT",
        "number_of_installments": 6,
        "start_date": "2025-01-31",
        "end_date": "2025-06-30",
        "created_at": "2025-01-02T10:00:00.000Z",
        "updated_at": "2025-01-02T10:00:00.000Z",
        "user": {
            "id": STUDENT_ID,
            "email": STUDENT_EMAIL,
            "first_name": "Sam",
            "last_name": "Student"
        }
    })
}

fn invoice(id: i64, status: &str, due_date: &str) -> Value {
    let paid_amount = if status == "PAID" { "200.00" } else { "0.00" };
    json!({
        "id": id,
        "user_id": STUDENT_ID,
        "payment_plan_id": 11,
        "invoice_number": format!("INV-{id:04}"),
        "amount": "200.00",
        "paid_amount": paid_amount,
        "status": status,
        "due_date": due_date,
        "created_at": "2025-01-02T10:00:00.000Z",
        "user": {
            "id": STUDENT_ID,
            "email": STUDENT_EMAIL,
            "first_name": "Sam",
            "last_name": "Student"
        }
    })
}

fn ok(data: Value) -> Response {
    (StatusCode::OK, Json(json!({ "success": true, "data": data }))).into_response()
}

fn fail(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(json!({ "success": false, "error": error, "statusCode": status.as_u16() })),
    )
        .into_response()
}

fn page(items_key: &str, items: Vec<Value>) -> Value {
    let total = items.len();
    json!({
        items_key: items,
        "pagination": { "total": total, "page": 1, "limit": 10, "totalPages": 1 }
    })
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    let path = uri.path().to_string();
    let query = uri.query().unwrap_or_default().to_string();
    let body_json: Option<Value> = serde_json::from_slice(&body).ok();

    state.log.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: query.clone(),
        token: token.clone(),
        body: body_json.clone(),
    });

    if path == "/auth/login" && method == Method::POST {
        let body = body_json.unwrap_or_default();
        let email = body["email"].as_str().unwrap_or_default();
        let password = body["password"].as_str().unwrap_or_default();
        return match (email, password) {
            (ADMIN_EMAIL, PASSWORD) => ok(json!({ "user": admin_user(), "token": "admin-token" })),
            (STUDENT_EMAIL, PASSWORD) => {
                ok(json!({ "user": student_user(), "token": "student-token" }))
            }
            _ => fail(StatusCode::UNAUTHORIZED, "Invalid credentials"),
        };
    }

    let user = match token.as_deref() {
        _ if state.revoked.load(Ordering::SeqCst) => None,
        Some("admin-token") => Some(admin_user()),
        Some("student-token") => Some(student_user()),
        _ => None,
    };
    let Some(user) = user else {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    };

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("GET", ["auth", "me"]) => ok(json!({ "user": user })),

        ("GET", ["api", "users"]) => ok(json!([student_user()])),
        ("GET", ["api", "users", id]) if *id == STUDENT_ID.to_string() => ok(student_user()),

        ("GET", ["api", "payment-plans"]) => {
            ok(page("items", vec![plan(11, "ACTIVE"), plan(12, "CANCELLED")]))
        }
        ("POST", ["api", "payment-plans"]) => {
            let mut created = plan(13, "ACTIVE");
            created["schedules"] = json!([]);
            ok(created)
        }
        ("GET", ["api", "payment-plans", "user", _]) => ok(json!([plan(11, "ACTIVE")])),
        ("GET", ["api", "payment-plans", "11"]) => {
            let mut detail = plan(11, "ACTIVE");
            detail["schedules"] = json!([
                { "installment_number": 1, "due_date": "2025-01-31", "amount": "200.00", "status": "PAID" },
                { "installment_number": 2, "due_date": "2025-02-28", "amount": "200.00", "status": "UPCOMING" }
            ]);
            ok(detail)
        }
        ("GET", ["api", "payment-plans", "11", "summary"]) => {
            ok(json!({ "paid_installments": 1, "next_due_date": "2025-02-28" }))
        }
        ("GET", ["api", "payment-plans", _]) => fail(StatusCode::NOT_FOUND, "Payment plan not found"),
        ("PATCH", ["api", "payment-plans", _, "status"]) => ok(plan(11, "COMPLETED")),
        ("POST", ["api", "payment-plans", "11", "cancel"]) => ok(plan(11, "CANCELLED")),
        ("POST", ["api", "payment-plans", _, "cancel"]) => {
            fail(StatusCode::BAD_REQUEST, "Only active plans can be cancelled")
        }
        ("DELETE", ["api", "payment-plans", _]) => ok(Value::Null),

        ("GET", ["api", "invoices"]) => {
            let invoices = if query.contains("status=PAID") {
                vec![invoice(22, "PAID", "2025-01-31")]
            } else {
                vec![invoice(21, "DUE", "2020-01-01"), invoice(22, "PAID", "2025-01-31")]
            };
            ok(page("invoices", invoices))
        }
        ("GET", ["api", "invoices", "user", _]) => ok(json!([
            invoice(21, "DUE", "2020-01-01"),
            invoice(22, "PAID", "2025-01-31")
        ])),
        ("GET", ["api", "invoices", "21"]) => ok(invoice(21, "DUE", "2020-01-01")),
        ("GET", ["api", "invoices", _]) => fail(StatusCode::NOT_FOUND, "Invoice not found"),
        ("POST", ["api", "invoices", "21", "mark-paid"]) => ok(invoice(21, "PAID", "2020-01-01")),
        ("POST", ["api", "invoices", _, "mark-paid"]) => {
            fail(StatusCode::BAD_REQUEST, "Invoice already paid")
        }
        ("PATCH", ["api", "invoices", _, "status"]) => ok(invoice(21, "OUTSTANDING", "2020-01-01")),
        ("DELETE", ["api", "invoices", _]) => ok(Value::Null),

        _ => fail(StatusCode::NOT_FOUND, "Route not found"),
    }
}

/// Portal router wired to `backend`, plus its state for session assertions.
pub async fn portal(backend: &MockBackend) -> (Router, Arc<AppState>) {
    let state = Arc::new(
        init_state(PortalConfig::new(backend.url()))
            .await
            .expect("init state"),
    );
    (routes::router(state.clone()), state)
}

pub async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.expect("request failed")
}

pub async fn get(app: &Router, path: &str, cookie: Option<&str>) -> Response {
    let mut req = Request::builder().method("GET").uri(path);
    if let Some(c) = cookie {
        req = req.header(header::COOKIE, c);
    }
    send(app, req.body(Body::empty()).unwrap()).await
}

pub async fn post_form(app: &Router, path: &str, cookie: Option<&str>, form: &str) -> Response {
    let mut req = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(c) = cookie {
        req = req.header(header::COOKIE, c);
    }
    send(app, req.body(Body::from(form.to_string())).unwrap()).await
}

/// Logs in through the portal and returns the `session=...` cookie pair.
pub async fn login(app: &Router, email: &str) -> String {
    let form = format!("email={}&password={}", email.replace('@', "%40"), PASSWORD);
    let res = post_form(app, "/login", None, &form).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER, "login should redirect");
    res.headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .expect("session cookie")
}

pub fn location(res: &Response) -> &str {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub async fn body_text(res: Response) -> String {
    let bytes = to_bytes(res.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
