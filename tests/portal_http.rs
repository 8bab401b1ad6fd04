mod common;

use axum::http::{Method, StatusCode, header};
use chrono::{Local, Months};

use common::*;
use payportal::schedule::EMPTY_PREVIEW_MESSAGE;

#[tokio::test]
async fn protected_pages_redirect_to_login_without_session() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;

    for path in ["/", "/dashboard", "/payment-plans", "/invoices", "/payment-portal"] {
        let res = get(&app, path, None).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&res), "/login", "{path}");
    }

    let res = get(&app, "/dashboard", Some("session=not-a-real-token")).await;
    assert_eq!(location(&res), "/login");
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn login_sends_each_role_to_its_landing_page() {
    let backend = MockBackend::start().await;
    let (app, state) = portal(&backend).await;

    let form = format!("email=admin%40example.com&password={PASSWORD}");
    let res = post_form(&app, "/login", None, &form).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/dashboard");
    let cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));

    let form = format!("email=student%40example.com&password={PASSWORD}");
    let res = post_form(&app, "/login", None, &form).await;
    assert_eq!(location(&res), "/payment-portal");

    assert_eq!(state.sessions.len().await, 2);
    let sent = backend.find(Method::POST, "/auth/login").unwrap();
    assert_eq!(sent.body.unwrap()["email"], ADMIN_EMAIL);
}

#[tokio::test]
async fn bad_credentials_rerender_the_form() {
    let backend = MockBackend::start().await;
    let (app, state) = portal(&backend).await;

    let res = post_form(&app, "/login", None, "email=admin%40example.com&password=nope").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = body_text(res).await;
    assert!(body.contains("Invalid email or password. Please try again."));
    assert!(body.contains("admin@example.com"));
    assert_eq!(state.sessions.len().await, 0);

    let res = post_form(&app, "/login", None, "email=&password=").await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn login_page_skips_form_when_already_signed_in() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let cookie = login(&app, STUDENT_EMAIL).await;

    let res = get(&app, "/login", Some(&cookie)).await;
    assert_eq!(location(&res), "/payment-portal");

    let res = get(&app, "/login", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("Sign in to your account"));
}

#[tokio::test]
async fn role_gates_send_users_home() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let student = login(&app, STUDENT_EMAIL).await;
    let admin = login(&app, ADMIN_EMAIL).await;

    let res = get(&app, "/payment-plans", Some(&student)).await;
    assert_eq!(location(&res), "/payment-portal");
    let res = post_form(&app, "/invoices/21/mark-paid", Some(&student), "").await;
    assert_eq!(location(&res), "/payment-portal");
    assert!(backend.find(Method::POST, "/api/invoices/21/mark-paid").is_none());

    let res = get(&app, "/payment-portal", Some(&admin)).await;
    assert_eq!(location(&res), "/dashboard");
}

#[tokio::test]
async fn dashboard_refreshes_user_and_shows_role_cards() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let admin = login(&app, ADMIN_EMAIL).await;

    let res = get(&app, "/", Some(&admin)).await;
    assert_eq!(location(&res), "/dashboard");

    let res = get(&app, "/dashboard", Some(&admin)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_text(res).await;
    assert!(body.contains("Payment Plans"));
    assert!(body.contains("Ada Admin"));
    assert!(backend.find(Method::GET, "/auth/me").is_some());

    let student = login(&app, STUDENT_EMAIL).await;
    let body = body_text(get(&app, "/dashboard", Some(&student)).await).await;
    assert!(body.contains("Payment Portal"));
    assert!(!body.contains("View Plans"));
}

#[tokio::test]
async fn plan_list_renders_rows_and_status_actions() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let admin = login(&app, ADMIN_EMAIL).await;

    let res = get(&app, "/payment-plans?status=ACTIVE&search=sam&limit=20", Some(&admin)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_text(res).await;
    assert!(body.contains("Sam Student"));
    assert!(body.contains("$1,200.00"));
    assert!(body.contains("/payment-plans/11/cancel"));
    assert!(!body.contains("/payment-plans/11/delete"));
    assert!(body.contains("/payment-plans/12/delete"));
    assert!(body.contains("Showing 1 to 2 of 2 results"));

    let sent = backend.find(Method::GET, "/api/payment-plans").unwrap();
    assert!(sent.query.contains("page=1"));
    assert!(sent.query.contains("limit=20"));
    assert!(sent.query.contains("status=ACTIVE"));
    assert!(sent.query.contains("search=sam"));
    assert_eq!(sent.token.as_deref(), Some("admin-token"));
}

#[tokio::test]
async fn new_plan_form_lists_students_with_empty_preview() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let admin = login(&app, ADMIN_EMAIL).await;

    let res = get(&app, "/payment-plans/new", Some(&admin)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_text(res).await;
    assert!(body.contains("Sam Student (student@example.com)"));
    assert!(body.contains(&Local::now().date_naive().format("%Y-%m-%d").to_string()));
    assert!(body.contains(EMPTY_PREVIEW_MESSAGE));

    let sent = backend.find(Method::GET, "/api/users").unwrap();
    assert!(sent.query.contains("role=student"));
}

#[tokio::test]
async fn preview_fragment_follows_the_form() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let admin = login(&app, ADMIN_EMAIL).await;

    let form = "total_amount=1200&type=INSTALLMENT&number_of_installments=6&start_date=2025-01-31";
    let res = post_form(&app, "/payment-plans/preview", Some(&admin), form).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_text(res).await;
    assert!(body.contains("6 monthly installments"));
    assert!(body.contains("Feb 28, 2025"));
    assert!(body.contains("Jun 30, 2025"));
    assert!(body.contains("$200.00"));
    assert!(body.contains("$1,200.00"));

    let res = post_form(&app, "/payment-plans/preview", Some(&admin), "type=INSTALLMENT").await;
    assert!(body_text(res).await.contains(EMPTY_PREVIEW_MESSAGE));
}

#[tokio::test]
async fn preview_of_an_out_of_range_amount_is_empty() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let admin = login(&app, ADMIN_EMAIL).await;

    let form = "total_amount=79228162514264337593543950335&type=INSTALLMENT&number_of_installments=11&start_date=2025-01-31";
    let res = post_form(&app, "/payment-plans/preview", Some(&admin), form).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains(EMPTY_PREVIEW_MESSAGE));

    let user_id = format!("user_id={STUDENT_ID}&");
    let res = post_form(&app, "/payment-plans", Some(&admin), &format!("{user_id}{form}")).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(backend.find(Method::POST, "/api/payment-plans").is_none());
}

#[tokio::test]
async fn invalid_plan_is_not_sent_to_backend() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let admin = login(&app, ADMIN_EMAIL).await;

    let form = "user_id=&total_amount=&type=INSTALLMENT&number_of_installments=13&start_date=2000-01-01";
    let res = post_form(&app, "/payment-plans", Some(&admin), form).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_text(res).await;
    assert!(body.contains("Student is required"));
    assert!(body.contains("Total amount is required"));
    assert!(body.contains("Number of installments must be between 2 and 12"));
    assert!(body.contains("Start date cannot be in the past"));

    assert!(backend.find(Method::POST, "/api/payment-plans").is_none());
}

#[tokio::test]
async fn valid_plan_is_created_and_flashed() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let admin = login(&app, ADMIN_EMAIL).await;

    let start = Local::now()
        .date_naive()
        .checked_add_months(Months::new(1))
        .unwrap()
        .format("%Y-%m-%d")
        .to_string();
    let form = format!(
        "user_id=7&total_amount=1200.00&type=INSTALLMENT&number_of_installments=6&start_date={start}"
    );
    let res = post_form(&app, "/payment-plans", Some(&admin), &form).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/payment-plans");

    let sent = backend.find(Method::POST, "/api/payment-plans").unwrap();
    let body = sent.body.unwrap();
    assert_eq!(body["user_id"], 7);
    assert_eq!(body["total_amount"], 1200.0);
    assert_eq!(body["type"], "INSTALLMENT");
    assert_eq!(body["number_of_installments"], 6);
    assert_eq!(body["start_date"], start.as_str());

    let page = body_text(get(&app, "/payment-plans", Some(&admin)).await).await;
    assert!(page.contains("Payment plan created successfully!"));

    // Flash is shown once.
    let page = body_text(get(&app, "/payment-plans", Some(&admin)).await).await;
    assert!(!page.contains("Payment plan created successfully!"));
}

#[tokio::test]
async fn one_time_plan_omits_installment_count() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let admin = login(&app, ADMIN_EMAIL).await;

    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    let form = format!(
        "user_id=7&total_amount=100&type=ONE_TIME&number_of_installments=4&start_date={today}"
    );
    let res = post_form(&app, "/payment-plans", Some(&admin), &form).await;
    assert_eq!(location(&res), "/payment-plans");

    let body = backend.find(Method::POST, "/api/payment-plans").unwrap().body.unwrap();
    assert_eq!(body["type"], "ONE_TIME");
    assert!(body.get("number_of_installments").is_none());
}

#[tokio::test]
async fn plan_detail_shows_schedule_and_summary() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let admin = login(&app, ADMIN_EMAIL).await;

    let res = get(&app, "/payment-plans/11", Some(&admin)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_text(res).await;
    assert!(body.contains("Payment Plan #11"));
    assert!(body.contains("Feb 28, 2025"));
    assert!(body.contains("Paid installments"));
    assert!(backend.find(Method::GET, "/api/payment-plans/11/summary").is_some());

    let res = get(&app, "/payment-plans/404", Some(&admin)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn plan_actions_flash_results() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let admin = login(&app, ADMIN_EMAIL).await;

    let res = post_form(&app, "/payment-plans/11/cancel", Some(&admin), "").await;
    assert_eq!(location(&res), "/payment-plans");
    let page = body_text(get(&app, "/payment-plans", Some(&admin)).await).await;
    assert!(page.contains("Payment plan cancelled successfully"));

    let res = post_form(&app, "/payment-plans/12/cancel", Some(&admin), "").await;
    assert_eq!(location(&res), "/payment-plans");
    let page = body_text(get(&app, "/payment-plans", Some(&admin)).await).await;
    assert!(page.contains("Only active plans can be cancelled"));

    post_form(&app, "/payment-plans/12/delete", Some(&admin), "").await;
    let page = body_text(get(&app, "/payment-plans", Some(&admin)).await).await;
    assert!(page.contains("Payment plan deleted successfully"));
    assert!(backend.find(Method::DELETE, "/api/payment-plans/12").is_some());

    let res = post_form(&app, "/payment-plans/11/status", Some(&admin), "status=COMPLETED").await;
    assert_eq!(location(&res), "/payment-plans/11");
    let sent = backend.find(Method::PATCH, "/api/payment-plans/11/status").unwrap();
    assert_eq!(sent.body.unwrap()["status"], "COMPLETED");
}

#[tokio::test]
async fn invoices_mark_paid_and_status_updates() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let admin = login(&app, ADMIN_EMAIL).await;

    let body = body_text(get(&app, "/invoices", Some(&admin)).await).await;
    assert!(body.contains("INV-0021"));
    assert!(body.contains("Overdue"));
    assert!(body.contains("/invoices/21/mark-paid"));
    assert!(!body.contains("/invoices/22/mark-paid"));

    let res = post_form(&app, "/invoices/21/mark-paid", Some(&admin), "").await;
    assert_eq!(location(&res), "/invoices");
    let body = body_text(get(&app, "/invoices", Some(&admin)).await).await;
    assert!(body.contains("Invoice marked as paid successfully"));

    post_form(&app, "/invoices/99/mark-paid", Some(&admin), "").await;
    let body = body_text(get(&app, "/invoices", Some(&admin)).await).await;
    assert!(body.contains("Invoice already paid"));

    let res = post_form(&app, "/invoices/21/status", Some(&admin), "status=OUTSTANDING").await;
    assert_eq!(location(&res), "/invoices/21");
    let body = body_text(get(&app, "/invoices/21", Some(&admin)).await).await;
    assert!(body.contains("Invoice status updated to OUTSTANDING"));
}

#[tokio::test]
async fn students_only_see_their_own_invoices() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let student = login(&app, STUDENT_EMAIL).await;

    let res = get(&app, "/invoices?userId=1", Some(&student)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_text(res).await;
    assert!(!body.contains("Mark as Paid"));

    let sent = backend.find(Method::GET, "/api/invoices").unwrap();
    assert!(sent.query.contains(&format!("userId={STUDENT_ID}")));
}

#[tokio::test]
async fn transactions_list_paid_invoices() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let admin = login(&app, ADMIN_EMAIL).await;

    let body = body_text(get(&app, "/transactions", Some(&admin)).await).await;
    assert!(body.contains("INV-0022"));
    assert!(!body.contains("INV-0021"));

    let sent = backend.find(Method::GET, "/api/invoices").unwrap();
    assert!(sent.query.contains("status=PAID"));
}

#[tokio::test]
async fn payment_portal_shows_student_balance() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;
    let student = login(&app, STUDENT_EMAIL).await;

    let res = get(&app, "/payment-portal", Some(&student)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_text(res).await;
    assert!(body.contains("$200.00"));
    assert!(body.contains("INV-0021"));
    assert!(body.contains("Installment Plan"));
    assert!(backend.find(Method::GET, "/api/payment-plans/user/7").is_some());
    assert!(backend.find(Method::GET, "/api/invoices/user/7").is_some());
}

#[tokio::test]
async fn backend_rejecting_token_ends_the_session() {
    let backend = MockBackend::start().await;
    let (app, state) = portal(&backend).await;
    let admin = login(&app, ADMIN_EMAIL).await;
    assert_eq!(state.sessions.len().await, 1);

    backend.revoke_tokens();
    let res = get(&app, "/invoices", Some(&admin)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
    let cleared = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(state.sessions.len().await, 0);

    let res = get(&app, "/invoices", Some(&admin)).await;
    assert_eq!(location(&res), "/login");
}

#[tokio::test]
async fn logout_drops_the_session() {
    let backend = MockBackend::start().await;
    let (app, state) = portal(&backend).await;
    let admin = login(&app, ADMIN_EMAIL).await;

    let res = post_form(&app, "/logout", Some(&admin), "").await;
    assert_eq!(location(&res), "/login");
    assert_eq!(state.sessions.len().await, 0);

    let res = get(&app, "/dashboard", Some(&admin)).await;
    assert_eq!(location(&res), "/login");
}

#[tokio::test]
async fn unknown_paths_render_not_found() {
    let backend = MockBackend::start().await;
    let (app, _) = portal(&backend).await;

    let res = get(&app, "/no-such-page", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(body_text(res).await.contains("Page Not Found"));
}
