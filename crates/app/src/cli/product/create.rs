use clap::Args;
use rust_decimal::Decimal;
use storefront::money::to_minor;
use storefront_app::{
    database::{self, Db},
    domain::products::{
        PgProductsService, ProductsService,
        models::{NewProduct, ProductUuid},
    },
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CreateProductArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Product display name
    #[arg(long)]
    name: String,

    /// Unit price in major units, e.g. `24.99`
    #[arg(long)]
    price: Decimal,

    /// Units available for sale
    #[arg(long, default_value_t = 0)]
    count_in_stock: u32,

    /// Image reference
    #[arg(long, default_value = "")]
    image: String,

    /// Optional product UUID; generated when omitted
    #[arg(long)]
    product_uuid: Option<Uuid>,
}

pub(crate) async fn run(args: CreateProductArgs) -> Result<(), String> {
    let price = to_minor(args.price).map_err(|error| format!("invalid price: {error}"))?;
    let price = u64::try_from(price).map_err(|_| "price cannot be negative".to_string())?;

    let pool = database::connect(&args.database_url, 1)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let product = PgProductsService::new(Db::new(pool))
        .create_product(NewProduct {
            uuid: args
                .product_uuid
                .map_or_else(ProductUuid::new, ProductUuid::from_uuid),
            name: args.name,
            image: args.image,
            price,
            count_in_stock: args.count_in_stock,
        })
        .await
        .map_err(|error| format!("failed to create product: {error}"))?;

    println!("product_uuid: {}", product.uuid);
    println!("name: {}", product.name);
    println!("price: {}", product.price);
    println!("count_in_stock: {}", product.count_in_stock);

    Ok(())
}
