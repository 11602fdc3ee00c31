#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    frame_orders_server::run().await
}
