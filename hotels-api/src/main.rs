#[rocket::launch]
fn rocket() -> _ {
    hotels_api::rocket()
}
