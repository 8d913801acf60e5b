use serde_json::Value;

#[test]
fn openapi_documents_workflow_routes_and_wire_names() -> anyhow::Result<()> {
    // Build the OpenAPI document the same way the server does
    let doc = fieldtrack::docs::build_openapi(8000)?;
    let v = serde_json::to_value(&doc)?;

    let paths = v.get("paths").and_then(Value::as_object).expect("paths must exist");
    for path in [
        "/api/auth/register",
        "/api/auth/login",
        "/api/expenses",
        "/api/expenses/{id}",
        "/api/expenses/approve/{id}",
        "/api/expenses/reject/{id}",
        "/api/expenses/reimburse/{id}",
        "/api/resources/approve/{id}",
        "/api/reports/monthly-summary",
        "/api/approvals/field-work-reimbursement/pending",
    ] {
        assert!(paths.contains_key(path), "OpenAPI missing path '{}'", path);
    }
    assert!(paths["/api/expenses/approve/{id}"].get("put").is_some());

    let props = v
        .pointer("/components/schemas/Expense/properties")
        .and_then(Value::as_object)
        .expect("components.schemas.Expense.properties must exist");
    for key in ["Expense_ID", "Approval_Status", "Reimbursement_Status", "Expense_Category", "Date_Submitted"] {
        assert!(props.contains_key(key), "OpenAPI Expense schema missing '{}'", key);
    }

    let scheme = v
        .pointer("/components/securitySchemes/bearerAuth/scheme")
        .and_then(Value::as_str);
    assert_eq!(scheme, Some("bearer"));
    assert_eq!(v.pointer("/servers/0/url").and_then(Value::as_str), Some("http://localhost:8000"));

    Ok(())
}
