use std::sync::Arc;

use hotels_api::routes::hotels::{create_hotel, get_hotel, import_csv, list_hotels, update_hotel};
use hotels_api::hotels::ImportConfig;
use hotels_api::models::{ApiResponse, Hotel, HotelPage};
use hotels_api::test_support::{InMemoryHotelRepository, TestRocketBuilder};
use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use rocket::routes;
use serde_json::{Value, json};

fn client() -> Client {
    TestRocketBuilder::new()
        .with_hotel_repository(
            Arc::new(InMemoryHotelRepository::new()),
            ImportConfig::default(),
        )
        .mount_api_routes(routes![get_hotel, list_hotels, create_hotel, update_hotel, import_csv])
        .blocking_client()
}

fn hotel_body(name: &str) -> Value {
    json!({
        "name": name,
        "webLink": "https://www.ambassador-hotels.com",
        "country": "Taiwan",
        "city": "Hsinchu",
        "address": "Zhonghua Rd 188",
        "email": "hsinchu@ambassador.example",
        "isOpen": true,
        "longitude": 120.967,
        "latitude": "24.806"
    })
}

fn create(client: &Client, body: &Value) -> (Status, Value) {
    let response = client
        .post("/api/v1/hotels")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    let status = response.status();
    (status, response.into_json().expect("JSON body"))
}

#[test]
fn created_hotels_can_be_fetched() {
    let client = client();

    let (status, payload) = create(&client, &hotel_body("Ambassador Hsinchu"));
    assert_eq!(status, Status::Created);
    assert_eq!(payload["message"], "Hotel created successfully");
    let id = payload["data"]["id"].as_i64().expect("id");

    let response = client.get(format!("/api/v1/hotels/{id}")).dispatch();
    assert_eq!(response.status(), Status::Ok);
    let payload: ApiResponse<Hotel> = response.into_json().expect("hotel");
    assert_eq!(payload.message, "Hotel found successfully");
    assert_eq!(payload.data.name, "Ambassador Hsinchu");
    assert_eq!(payload.data.longitude, "120.967");
    assert_eq!(payload.data.web_link.as_deref(), Some("https://www.ambassador-hotels.com"));
}

#[test]
fn missing_hotels_are_not_found() {
    let client = client();

    let response = client.get("/api/v1/hotels/41").dispatch();
    assert_eq!(response.status(), Status::NotFound);
    let payload: Value = response.into_json().expect("JSON body");
    assert_eq!(payload["message"], "Hotel with ID 41 not found");
    assert_eq!(payload["error"], "Not Found");
}

#[test]
fn invalid_bodies_list_every_violation() {
    let client = client();
    let mut body = hotel_body("");
    body["email"] = json!("not-an-email");
    body["latitude"] = json!(91);

    let (status, payload) = create(&client, &body);
    assert_eq!(status, Status::BadRequest);
    assert_eq!(
        payload["message"],
        "name should not be empty; email must be an email; latitude must not be greater than 90"
    );
}

#[test]
fn duplicate_names_conflict() {
    let client = client();
    create(&client, &hotel_body("Ambassador Hsinchu"));

    let (status, payload) = create(&client, &hotel_body("Ambassador Hsinchu"));
    assert_eq!(status, Status::Conflict);
    assert_eq!(payload["message"], "Hotel name already exists");
}

#[test]
fn listing_pages_through_hotels() {
    let client = client();
    for i in 1..=12 {
        create(&client, &hotel_body(&format!("Hotel {i:02}")));
    }

    let response = client.get("/api/v1/hotels?page=2").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let payload: ApiResponse<HotelPage> = response.into_json().expect("page");
    assert_eq!(payload.message, "Hotels found successfully");
    assert_eq!(payload.data.page, 2);
    let names: Vec<_> = payload.data.hotels.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["Hotel 11", "Hotel 12"]);

    let response = client.get("/api/v1/hotels?page=abc").dispatch();
    let payload: ApiResponse<HotelPage> = response.into_json().expect("page");
    assert_eq!(payload.data.page, 1);
    assert_eq!(payload.data.hotels.len(), 10);

    let response = client.get("/api/v1/hotels?page=0").dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    let payload: Value = response.into_json().expect("JSON body");
    assert_eq!(
        payload["message"],
        "Page must be an integer greater than or equal to 1"
    );
}

#[test]
fn patch_updates_only_present_fields() {
    let client = client();
    let (_, created) = create(&client, &hotel_body("Ambassador Hsinchu"));
    let id = created["data"]["id"].as_i64().expect("id");

    let response = client
        .patch(format!("/api/v1/hotels/{id}"))
        .header(ContentType::JSON)
        .body(json!({ "isOpen": false, "city": "Hsinchu City" }).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);

    let payload: ApiResponse<Hotel> = response.into_json().expect("hotel");
    assert_eq!(payload.message, "Hotel updated successfully");
    assert_eq!(payload.data.name, "Ambassador Hsinchu");
    assert_eq!(payload.data.city, "Hsinchu City");
    assert!(!payload.data.is_open);
}

#[test]
fn patch_rejects_unknown_hotels_and_invalid_values() {
    let client = client();
    let (_, created) = create(&client, &hotel_body("Ambassador Hsinchu"));
    let id = created["data"]["id"].as_i64().expect("id");

    let response = client
        .patch("/api/v1/hotels/999")
        .header(ContentType::JSON)
        .body(json!({ "city": "Taichung" }).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::NotFound);

    let response = client
        .patch(format!("/api/v1/hotels/{id}"))
        .header(ContentType::JSON)
        .body(json!({ "webLink": "ftp://files.example" }).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    let payload: Value = response.into_json().expect("JSON body");
    assert_eq!(payload["message"], "webLink must be a URL address");
}
