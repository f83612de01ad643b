//! HTTP tests over the full router.

use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::codec::Row;
use crate::config::SheetsBackend;
use crate::sheets::memory::MemorySheet;
use crate::test_utils::{
    FailingSheet, MissingSheet, create_test_app, create_test_app_with_gateway, create_test_config, install_crypto_provider,
    service_account_json,
};

const TIMESTAMP: &str = "10/01/2025 14:30:00";

fn row(values: &[&str]) -> Row {
    values.iter().map(|v| v.to_string()).collect()
}

fn header() -> Row {
    row(&["Unidade", "Categoria", "Descrição", "Marca", "Nº de Série", "Estado", "Data/Hora"])
}

fn common_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("unidade", "TI"),
        ("categoria", "Notebook"),
        ("descricao", "Dell 14"),
        ("marca", "Dell"),
        ("estado", "Novo"),
    ]
}

#[test_log::test(tokio::test)]
async fn test_submit_same_serial_appends_identical_rows() {
    let (server, sheet) = create_test_app();

    let mut form = common_fields();
    form.extend([("quantidade", "3"), ("serial_igual", "sim"), ("n_serie_unico", "SN-100")]);
    let response = server.post("/submit").form(&form).await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/sucesso");

    let values = sheet.snapshot();
    assert_eq!(values.len(), 4);
    let expected = row(&["TI", "Notebook", "Dell 14", "Dell", "SN-100", "Novo", TIMESTAMP]);
    for appended in &values[1..] {
        assert_eq!(appended, &expected);
    }
}

#[tokio::test]
async fn test_submit_leaves_existing_rows_untouched() {
    let existing = vec![
        header(),
        row(&["ADM", "Mesa", "Madeira", "Tok", "M-9", "Usado", "03/02/2024 11:00:00"]),
        row(&["RH", "Cadeira"]),
    ];
    let sheet = Arc::new(MemorySheet::from_values(existing.clone()));
    let server = create_test_app_with_gateway(sheet.clone());

    let mut form = common_fields();
    form.extend([("quantidade", "3"), ("serial_igual", "sim"), ("n_serie_unico", "SN-100")]);
    server.post("/submit").form(&form).await.assert_status(StatusCode::SEE_OTHER);

    let values = sheet.snapshot();
    assert_eq!(values.len(), existing.len() + 3);
    assert_eq!(values[..existing.len()], existing[..]);
    let expected = row(&["TI", "Notebook", "Dell 14", "Dell", "SN-100", "Novo", TIMESTAMP]);
    for appended in &values[existing.len()..] {
        assert_eq!(appended, &expected);
    }
}

#[tokio::test]
async fn test_submit_distinct_serials() {
    let (server, sheet) = create_test_app();

    let mut form = common_fields();
    form.extend([
        ("quantidade", "2"),
        ("serial_igual", "nao"),
        ("n_serie_multiplos[]", "A-1"),
        ("n_serie_multiplos[]", "A-2"),
    ]);
    server.post("/submit").form(&form).await.assert_status(StatusCode::SEE_OTHER);

    let serials: Vec<_> = sheet.snapshot()[1..].iter().map(|r| r[4].clone()).collect();
    assert_eq!(serials, vec!["A-1", "A-2"]);
}

#[tokio::test]
async fn test_submit_without_serials_still_redirects() {
    let (server, sheet) = create_test_app();

    let mut form = common_fields();
    form.push(("serial_igual", "nao"));
    let response = server.post("/submit").form(&form).await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(sheet.snapshot().len(), 1);
}

#[tokio::test]
async fn test_submit_missing_field_is_plain_text_error() {
    let (server, sheet) = create_test_app();

    let response = server.post("/submit").form(&[("unidade", "TI")]).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.header("content-type").to_str().unwrap().starts_with("text/plain"));
    assert_eq!(response.text(), "Dados inválidos: Campo obrigatório ausente: categoria");
    assert_eq!(sheet.snapshot().len(), 1);
}

#[tokio::test]
async fn test_submit_over_quantity_limit() {
    let (server, sheet) = create_test_app();

    let mut form = common_fields();
    form.extend([("quantidade", "501"), ("serial_igual", "sim"), ("n_serie_unico", "X")]);
    server.post("/submit").form(&form).await.assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(sheet.snapshot().len(), 1);
}

#[tokio::test]
async fn test_submit_to_missing_sheet() {
    let server = create_test_app_with_gateway(Arc::new(MissingSheet));

    let mut form = common_fields();
    form.extend([("serial_igual", "sim"), ("n_serie_unico", "X")]);
    let response = server.post("/submit").form(&form).await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(response.text().starts_with("Erro: A planilha não foi encontrada"));
}

#[tokio::test]
async fn test_list_items_numbers_rows_from_two() {
    let sheet = Arc::new(MemorySheet::from_values(vec![
        header(),
        row(&["TI", "Notebook", "Dell 14", "Dell", "SN-1", "Novo", "01/02/2024 10:00:00"]),
        row(&["RH", "Cadeira"]),
        row(&["ADM", "Mesa", "Madeira", "Tok", "M-9", "Usado", "03/02/2024 11:00:00"]),
    ]));
    let server = create_test_app_with_gateway(sheet);

    let response = server.get("/api/items").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let items = body["items"].as_array().unwrap();
    let rows: Vec<_> = items.iter().map(|i| i["row_number"].as_u64().unwrap()).collect();
    assert_eq!(rows, vec![2, 3, 4]);
    assert_eq!(
        items[1],
        json!({
            "row_number": 3,
            "unidade": "RH",
            "categoria": "Cadeira",
            "descricao": "",
            "marca": "",
            "n_serie": "",
            "estado": "",
            "timestamp": ""
        })
    );
}

#[tokio::test]
async fn test_list_items_on_empty_sheet() {
    let server = create_test_app_with_gateway(Arc::new(MemorySheet::from_values(vec![])));

    let response = server.get("/api/items").await;
    response.assert_status_ok();
    response.assert_json(&json!({"items": []}));
}

#[tokio::test]
async fn test_list_items_sheet_not_found() {
    let server = create_test_app_with_gateway(Arc::new(MissingSheet));

    let response = server.get("/api/items").await;

    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&json!({"error": "Planilha não encontrada"}));
}

#[tokio::test]
async fn test_list_items_remote_failure() {
    let server = create_test_app_with_gateway(Arc::new(FailingSheet("Google API error during read rows: 429 - quota")));

    let response = server.get("/api/items").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_json(&json!({"error": "Google API error during read rows: 429 - quota"}));
}

#[test_log::test(tokio::test)]
async fn test_update_row_changes_only_target() {
    let sheet = Arc::new(MemorySheet::from_values(vec![
        header(),
        row(&["TI", "Notebook", "A", "Dell", "1", "Novo", "t1"]),
        row(&["TI", "Notebook", "B", "Dell", "2", "Novo", "t2"]),
        row(&["TI", "Notebook", "C", "Dell", "3", "Novo", "t3"]),
    ]));
    let before = sheet.snapshot();
    let server = create_test_app_with_gateway(sheet.clone());

    let response = server
        .post("/api/update_row")
        .json(&json!({
            "row_number": 3,
            "unidade": "RH",
            "categoria": "Notebook",
            "descricao": "B",
            "marca": "Dell",
            "n_serie": "2",
            "estado": "Danificado"
        }))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({"success": true}));

    let after = sheet.snapshot();
    assert_eq!(after[2], row(&["RH", "Notebook", "B", "Dell", "2", "Danificado", TIMESTAMP]));
    for index in [0, 1, 3] {
        assert_eq!(after[index], before[index]);
    }
}

#[tokio::test]
async fn test_update_row_accepts_string_row_number_and_timestamp() {
    let sheet = Arc::new(MemorySheet::from_values(vec![header(), row(&["x"])]));
    let server = create_test_app_with_gateway(sheet.clone());

    server
        .post("/api/update_row")
        .json(&json!({"row_number": "2", "unidade": "TI", "timestamp": "05/05/2024 05:05:05"}))
        .await
        .assert_status_ok();

    assert_eq!(sheet.snapshot()[1], row(&["TI", "", "", "", "", "", "05/05/2024 05:05:05"]));
}

#[tokio::test]
async fn test_update_row_rejects_bad_parameters() {
    let (server, sheet) = create_test_app();

    for body in [
        json!({"unidade": "TI"}),
        json!({"row_number": "abc"}),
        json!({"row_number": true}),
        json!(42),
    ] {
        let response = server.post("/api/update_row").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"error": "Parâmetros inválidos"}));
    }

    let response = server.post("/api/update_row").text("not json").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // The header row is never overwritten
    server
        .post("/api/update_row")
        .json(&json!({"row_number": 1, "unidade": "TI"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(sheet.snapshot(), vec![header()]);
}

#[tokio::test]
async fn test_update_row_sheet_not_found() {
    let server = create_test_app_with_gateway(Arc::new(MissingSheet));

    let response = server.post("/api/update_row").json(&json!({"row_number": 2})).await;

    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&json!({"error": "Planilha não encontrada"}));
}

#[tokio::test]
async fn test_update_row_far_past_grid_keeps_serving() {
    let (server, sheet) = create_test_app();

    let response = server
        .post("/api/update_row")
        .json(&json!({"row_number": 4294967295u64, "unidade": "TI"}))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("exceeds grid limits"));

    server.get("/healthz").await.assert_text("OK");
    assert_eq!(sheet.snapshot(), vec![header()]);
}

#[tokio::test]
async fn test_update_row_accepts_whole_float_row_number() {
    let sheet = Arc::new(MemorySheet::from_values(vec![header(), row(&["x"]), row(&["y"])]));
    let server = create_test_app_with_gateway(sheet.clone());

    server
        .post("/api/update_row")
        .json(&json!({"row_number": 3.0, "unidade": "RH"}))
        .await
        .assert_status_ok();
    assert_eq!(sheet.snapshot()[2], row(&["RH", "", "", "", "", "", TIMESTAMP]));

    server
        .post("/api/update_row")
        .json(&json!({"row_number": 2.5, "unidade": "RH"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(sheet.snapshot()[1], row(&["x"]));
}

#[tokio::test]
async fn test_update_row_null_timestamp_clears_cell() {
    let sheet = Arc::new(MemorySheet::from_values(vec![header(), row(&["x"])]));
    let server = create_test_app_with_gateway(sheet.clone());

    server
        .post("/api/update_row")
        .json(&json!({"row_number": 2, "unidade": "TI", "timestamp": null}))
        .await
        .assert_status_ok();
    assert_eq!(sheet.snapshot()[1], row(&["TI", "", "", "", "", "", ""]));

    server
        .post("/api/update_row")
        .json(&json!({"row_number": 2, "unidade": "TI"}))
        .await
        .assert_status_ok();
    assert_eq!(sheet.snapshot()[1], row(&["TI", "", "", "", "", "", TIMESTAMP]));
}

#[tokio::test]
async fn test_update_form_redirects_to_inventory() {
    let sheet = Arc::new(MemorySheet::from_values(vec![header(), row(&["a"]), row(&["b"])]));
    let server = create_test_app_with_gateway(sheet.clone());

    let response = server
        .post("/update")
        .form(&[("row_number", "3"), ("unidade", "RH"), ("estado", "Usado")])
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/inventario");
    assert_eq!(sheet.snapshot()[2], row(&["RH", "", "", "", "", "Usado", TIMESTAMP]));
    assert_eq!(sheet.snapshot()[1], row(&["a"]));
}

#[tokio::test]
async fn test_update_form_failures_are_plain_text() {
    let server = create_test_app_with_gateway(Arc::new(FailingSheet("boom")));

    let response = server.post("/update").form(&[("row_number", "2")]).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), "Ocorreu um erro ao atualizar: boom");

    let response = server.post("/update").form(&[("unidade", "TI")]).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pages_and_health() {
    let (server, _sheet) = create_test_app();

    for path in ["/", "/inventario", "/sucesso"] {
        let response = server.get(path).await;
        response.assert_status_ok();
        assert!(response.header("content-type").to_str().unwrap().starts_with("text/html"));
    }

    server.get("/healthz").await.assert_text("OK");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (server, _sheet) = create_test_app();

    let response = server.get("/api-docs/openapi.json").await;
    response.assert_status_ok();
    let doc: serde_json::Value = response.json();
    assert!(doc["paths"]["/api/items"]["get"].is_object());

    server.get("/docs").await.assert_status_ok();
}

#[tokio::test]
async fn test_google_backend_without_credentials() {
    install_crypto_provider();
    let mut config = create_test_config();
    config.sheets.backend = SheetsBackend::Google;

    let server = crate::Application::new(config).unwrap().into_test_server();
    let response = server.get("/api/items").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("GOOGLE_CREDENTIALS_JSON"));
}

#[test_log::test(tokio::test)]
async fn test_google_backend_end_to_end() {
    install_crypto_provider();
    let google = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .mount(&google)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"id": "sheet-123", "name": "Levantamento de Bens - FUNDEC"}]
        })))
        .mount(&google)
        .await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sheets": [{"properties": {"sheetId": 0, "title": "Sheet1", "index": 0}}]
        })))
        .mount(&google)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/sheet-123/values/'Sheet1'$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Sheet1!A1:G2",
            "majorDimension": "ROWS",
            "values": [
                ["Unidade", "Categoria", "Descrição", "Marca", "Nº de Série", "Estado", "Data/Hora"],
                ["TI", "Notebook", "Dell 14", "Dell", "SN-1", "Novo", "01/02/2024 10:00:00"]
            ]
        })))
        .mount(&google)
        .await;

    let mut config = create_test_config();
    config.sheets.backend = SheetsBackend::Google;
    config.sheets.credentials_json = Some(service_account_json(&format!("{}/token", google.uri())));
    config.sheets.sheets_base_url = Url::parse(&format!("{}/v4/", google.uri())).unwrap();
    config.sheets.drive_base_url = Url::parse(&format!("{}/drive/v3/", google.uri())).unwrap();
    config.sheets.request_timeout = Duration::from_secs(5);

    let server = crate::Application::new(config).unwrap().into_test_server();
    let response = server.get("/api/items").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["items"][0]["row_number"], 2);
    assert_eq!(body["items"][0]["n_serie"], "SN-1");
}
