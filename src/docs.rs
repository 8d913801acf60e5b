use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
	info(title = "FieldTrack API", description = "Expense claims, resource requests and their approval workflow"),
	paths(
		routes::health::health,
		routes::auth::register,
		routes::auth::login,
		routes::auth::logout,
		routes::expenses::list_expenses,
		routes::expenses::submit_expense,
		routes::expenses::get_expense,
		routes::expenses::update_expense,
		routes::expenses::delete_expense,
		routes::expenses::approve_expense,
		routes::expenses::reject_expense,
		routes::expenses::reimburse_expense,
		routes::expenses::upload_receipt,
		routes::expenses::download_receipt,
		routes::approvals::list_approval_statuses,
		routes::approvals::pending_field_work,
		routes::resources::list_resources,
		routes::resources::submit_resource,
		routes::resources::get_resource,
		routes::resources::update_resource,
		routes::resources::delete_resource,
		routes::resources::approve_resource,
		routes::resources::reject_resource,
		routes::reports::monthly_summary,
		routes::profile::me,
		routes::profile::update_me,
		routes::employees::list_employees
	),
	components(
		schemas(
			crate::authz::Role,
			crate::workflow::states::ApprovalStatus,
			crate::workflow::states::ReimbursementStatus,
			crate::workflow::states::ResourceStatus,
			models::MessageResponse,
			models::SuccessResponse,
			models::employee::Employee,
			models::employee::RegisterRequest,
			models::employee::RegisterResponse,
			models::employee::LoginRequest,
			models::employee::LoginResponse,
			models::employee::ProfileUpdateRequest,
			models::expense::Expense,
			models::expense::ExpenseCreateRequest,
			models::expense::ExpenseUpdateRequest,
			models::expense::ExpenseCreatedResponse,
			models::expense::ApprovalStatusEntry,
			models::expense::ReceiptUploadForm,
			models::expense::ReceiptUploadResponse,
			models::resource::Resource,
			models::resource::ResourceCreateRequest,
			models::resource::ResourceUpdateRequest,
			models::resource::ResourceCreatedResponse,
			models::report::ExpenseTypeTotal,
			routes::health::HealthResponse
		)
	),
	tags(
		(name = "Auth", description = "Registration and login"),
		(name = "Expenses", description = "Expense claims and their approval"),
		(name = "Approvals", description = "Finance review views"),
		(name = "Resources", description = "Resource requests and their approval"),
		(name = "Reports", description = "Monthly expense summaries"),
		(name = "Profile", description = "The caller's own record"),
		(name = "Employees", description = "Employee directory"),
		(name = "Health", description = "Liveness")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(&ApiDoc::openapi())?;

	normalize_path_operations(&mut doc);
	ensure_security_components(&mut doc);
	ensure_global_security(&mut doc);
	ensure_openapi_version(&mut doc);
	add_examples(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> Router {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc = Arc::new(doc);
	let json_route = get(move || {
		let doc = Arc::clone(&doc);
		async move { Json((*doc).clone()) }
	});

	Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config))
}

fn root_object(doc: &mut Value) -> Option<&mut Map<String, Value>> {
	doc.as_object_mut()
}

fn normalize_path_operations(doc: &mut Value) {
	if let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) {
		let snapshot = paths.clone();
		for (path, item) in snapshot {
			if let Some(ops) = item.as_object() {
				let mut normalized = Map::new();
				for (method, val) in ops {
					let key = method.to_lowercase();
					if let Some(existing) = normalized.get_mut(&key) {
						merge_values(existing, val);
					} else {
						normalized.insert(key, val.clone());
					}
				}
				paths.insert(path, Value::Object(normalized));
			}
		}
	}
}

fn ensure_security_components(doc: &mut Value) {
	let Some(root) = root_object(doc) else { return };
	let components = root
		.entry("components")
		.or_insert_with(|| Value::Object(Map::new()));
	let Some(components) = components.as_object_mut() else { return };
	let schemes = components
		.entry("securitySchemes")
		.or_insert_with(|| Value::Object(Map::new()));

	if let Some(schemes) = schemes.as_object_mut() {
		schemes.insert(
			"bearerAuth".to_string(),
			json!({
				"type": "http",
				"scheme": "bearer",
				"bearerFormat": "JWT"
			}),
		);
	}
}

fn ensure_global_security(doc: &mut Value) {
	if let Some(root) = root_object(doc) {
		root.entry("security")
			.or_insert_with(|| json!([{ "bearerAuth": [] }]));
	}
}

fn ensure_openapi_version(doc: &mut Value) {
	if let Some(root) = root_object(doc) {
		root.entry("openapi")
			.or_insert_with(|| Value::String("3.1.0".to_string()));
	}
}

fn add_examples(doc: &mut Value) {
	if let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) {
		for item in paths.values_mut() {
			if let Some(operations) = item.as_object_mut() {
				for operation in operations.values_mut() {
					apply_parameter_examples(operation);
					apply_request_examples(operation);
				}
			}
		}
	}
}

fn apply_parameter_examples(operation: &mut Value) {
	let Some(parameters) = operation.get_mut("parameters").and_then(Value::as_array_mut) else { return };

	for parameter in parameters.iter_mut() {
		let example = match parameter.get("name").and_then(Value::as_str) {
			Some("id") => json!(1),
			Some("month") => json!("3"),
			Some("year") => json!("2025"),
			_ => continue,
		};
		if let Some(obj) = parameter.as_object_mut() {
			obj.entry("example").or_insert(example);
		}
	}
}

fn apply_request_examples(operation: &mut Value) {
	let Some(request_body) = operation.get_mut("requestBody") else { return };
	let Some(content) = request_body.get_mut("content").and_then(Value::as_object_mut) else { return };
	let Some(app_json) = content.get_mut("application/json").and_then(Value::as_object_mut) else { return };
	let Some(reference) = app_json
		.get("schema")
		.and_then(|schema| schema.get("$ref"))
		.and_then(Value::as_str)
	else {
		return;
	};

	let example = match reference {
		"#/components/schemas/RegisterRequest" => json!({
			"name": "Ada Lovelace",
			"department": "finance",
			"email": "ada@example.com",
			"password": "S3cureP@ssw0rd"
		}),
		"#/components/schemas/LoginRequest" => json!({
			"email": "ada@example.com",
			"password": "S3cureP@ssw0rd"
		}),
		"#/components/schemas/ExpenseCreateRequest" => json!({
			"expense_type": "Travel",
			"amount": 120.5,
			"description": "Train to the north site",
			"expense_category": "Field Work",
			"field_work_details": {"site": "North yard", "days": 2}
		}),
		"#/components/schemas/ResourceCreateRequest" => json!({
			"resource_name": "Safety helmet",
			"quantity": 2,
			"reason": "Site visit next week"
		}),
		_ => return,
	};

	app_json.insert("example".to_string(), example);
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = format!("http://localhost:{port}");

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			if let Some(root) = root_object(doc) {
				root.insert("servers".to_string(), json!([{ "url": server_url }]));
			}
		}
	}
}

fn merge_values(target: &mut Value, addition: &Value) {
	match (target, addition) {
		(Value::Object(dest), Value::Object(src)) => {
			for (key, value) in src {
				if let Some(existing) = dest.get_mut(key) {
					merge_values(existing, value);
				} else {
					dest.insert(key.clone(), value.clone());
				}
			}
		}
		(Value::Array(dest), Value::Array(src)) => {
			for item in src {
				if !dest.contains(item) {
					dest.push(item.clone());
				}
			}
		}
		_ => {}
	}
}
