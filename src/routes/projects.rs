use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::json;

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::models::project::{
    Project, ProjectFilter, ProjectForm, PROJECT_CATEGORIES, PROJECT_STATUSES,
};
use crate::validate;

use super::{created, fail, ok, ok_message, pagination, validation_failure, ApiResult};

#[get("/?<category>&<featured>&<status>&<limit>&<page>")]
pub fn list(
    pool: &State<DbPool>,
    category: Option<&str>,
    featured: Option<bool>,
    status: Option<&str>,
    limit: Option<i64>,
    page: Option<i64>,
) -> ApiResult {
    if let Some(c) = category {
        if !PROJECT_CATEGORIES.contains(&c) {
            return fail(Status::BadRequest, "Invalid category");
        }
    }
    if let Some(s) = status {
        if !PROJECT_STATUSES.contains(&s) {
            return fail(Status::BadRequest, "Invalid status");
        }
    }

    let limit = validate::clamp(limit, 20, 1, 50);
    let page = page.unwrap_or(1).max(1);
    let offset = (page - 1) * limit;

    let filter = ProjectFilter {
        category,
        featured,
        status,
    };
    let projects = Project::list(pool, &filter, limit, offset);
    let total = Project::count(pool, &filter);

    ok(json!({
        "projects": projects,
        "pagination": pagination(page, limit, total),
    }))
}

#[get("/<id>")]
pub fn get(pool: &State<DbPool>, id: i64) -> ApiResult {
    match Project::find_by_id(pool, id) {
        Some(project) => ok(json!(project)),
        None => fail(Status::NotFound, "Project not found"),
    }
}

#[get("/featured/list?<limit>")]
pub fn featured(pool: &State<DbPool>, limit: Option<i64>) -> ApiResult {
    let limit = validate::clamp(limit, 6, 1, 20);
    ok(json!({"projects": Project::featured_list(pool, limit)}))
}

#[get("/categories/stats")]
pub fn category_stats(pool: &State<DbPool>) -> ApiResult {
    ok(json!({
        "overall": Project::overall_stats(pool),
        "categories": Project::category_stats(pool),
    }))
}

#[post("/", format = "json", data = "<form>")]
pub fn create(_admin: AdminUser, pool: &State<DbPool>, form: Json<ProjectForm>) -> ApiResult {
    let errors = validate::validate_project(&form);
    if !errors.is_empty() {
        return validation_failure(errors);
    }

    match Project::create(pool, &form) {
        Ok(id) => match Project::find_by_id(pool, id) {
            Some(project) => created("Project created", json!(project)),
            None => created("Project created", json!({"id": id})),
        },
        Err(e) => {
            log::error!("failed to create project: {}", e);
            fail(Status::InternalServerError, "Failed to create project")
        }
    }
}

#[put("/<id>", format = "json", data = "<form>")]
pub fn update(
    _admin: AdminUser,
    pool: &State<DbPool>,
    id: i64,
    form: Json<ProjectForm>,
) -> ApiResult {
    let errors = validate::validate_project(&form);
    if !errors.is_empty() {
        return validation_failure(errors);
    }

    match Project::update(pool, id, &form) {
        Ok(true) => match Project::find_by_id(pool, id) {
            Some(project) => ok(json!(project)),
            None => ok_message("Project updated"),
        },
        Ok(false) => fail(Status::NotFound, "Project not found"),
        Err(e) => {
            log::error!("failed to update project {}: {}", id, e);
            fail(Status::InternalServerError, "Failed to update project")
        }
    }
}

#[delete("/<id>")]
pub fn delete(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> ApiResult {
    match Project::delete(pool, id) {
        Ok(true) => ok_message("Project deleted"),
        Ok(false) => fail(Status::NotFound, "Project not found"),
        Err(e) => {
            log::error!("failed to delete project {}: {}", id, e);
            fail(Status::InternalServerError, "Failed to delete project")
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, get, featured, category_stats, create, update, delete]
}
