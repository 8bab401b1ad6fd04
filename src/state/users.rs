use crate::models::{StudentOption, User};

use super::{ApiResult, AppState};

/// Students for the plan form's selector.
pub async fn list_students(state: &AppState, api_token: &str) -> ApiResult<Vec<StudentOption>> {
    let users: Vec<User> = state
        .api
        .get(Some(api_token), "/api/users", &[("role", "student".to_string())])
        .await?;
    Ok(users.iter().map(StudentOption::from).collect())
}

pub async fn search_students(
    state: &AppState,
    api_token: &str,
    query: &str,
) -> ApiResult<Vec<StudentOption>> {
    let users: Vec<User> = state
        .api
        .get(
            Some(api_token),
            "/api/users",
            &[("role", "student".to_string()), ("search", query.trim().to_string())],
        )
        .await?;
    Ok(users.iter().map(StudentOption::from).collect())
}

pub async fn get_user(state: &AppState, api_token: &str, id: i64) -> ApiResult<User> {
    state.api.get(Some(api_token), &format!("/api/users/{id}"), &[]).await
}
