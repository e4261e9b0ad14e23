//! Seed the database with demo catalog data.
//!
//! Inserts a small set of collections, products, and customers so a fresh
//! environment has something to browse. Rows that already exist (matched by
//! collection/product title or customer email) are skipped, so the command
//! is safe to re-run.

use std::collections::HashMap;

use secrecy::SecretString;
use tracing::info;

use marketrow_core::{CollectionId, Email, Membership, Money};
use marketrow_storefront::models::{NewCollection, NewCustomer, NewProduct};
use marketrow_storefront::store::Store;
use marketrow_storefront::store::postgres::PgStore;

struct DemoProduct {
    title: &'static str,
    description: &'static str,
    price_cents: i64,
    inventory: i32,
    collection: &'static str,
}

struct DemoCustomer {
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    phone: &'static str,
    membership: Membership,
}

const DEMO_COLLECTIONS: [&str; 2] = ["Pantry", "Bakehouse"];

const DEMO_PRODUCTS: [DemoProduct; 5] = [
    DemoProduct {
        title: "Olive Oil",
        description: "Cold-pressed extra virgin, 500ml.",
        price_cents: 1000,
        inventory: 120,
        collection: "Pantry",
    },
    DemoProduct {
        title: "Sea Salt",
        description: "Coarse flakes from the Atlantic coast.",
        price_cents: 500,
        inventory: 200,
        collection: "Pantry",
    },
    DemoProduct {
        title: "Wildflower Honey",
        description: "Raw and unfiltered, 340g jar.",
        price_cents: 850,
        inventory: 64,
        collection: "Pantry",
    },
    DemoProduct {
        title: "Sourdough Loaf",
        description: "Naturally leavened, baked daily.",
        price_cents: 600,
        inventory: 30,
        collection: "Bakehouse",
    },
    DemoProduct {
        title: "Rye Crackers",
        description: "Seeded crispbread, 200g box.",
        price_cents: 425,
        inventory: 80,
        collection: "Bakehouse",
    },
];

const DEMO_CUSTOMERS: [DemoCustomer; 2] = [
    DemoCustomer {
        first_name: "Jo",
        last_name: "March",
        email: "jo@example.com",
        phone: "555-0101",
        membership: Membership::Gold,
    },
    DemoCustomer {
        first_name: "Theo",
        last_name: "Laurence",
        email: "theo@example.com",
        phone: "555-0102",
        membership: Membership::Bronze,
    },
];

/// Seed demo rows in a single transaction.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or any insert fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let database_url = std::env::var("MARKETROW_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "MARKETROW_DATABASE_URL not set")?;

    let store = PgStore::connect(&database_url).await?;
    info!("Connected to database");

    let mut tx = store.begin().await?;

    let mut inserted = 0_usize;
    let mut skipped = 0_usize;

    // Collections first; products reference them by id
    let existing_collections = tx.list_collections().await?;
    let mut collection_ids: HashMap<&str, CollectionId> = HashMap::new();
    for title in DEMO_COLLECTIONS {
        if let Some(found) = existing_collections.iter().find(|c| c.title == title) {
            collection_ids.insert(title, found.id);
            skipped += 1;
        } else {
            let collection = tx
                .insert_collection(&NewCollection {
                    title: title.to_owned(),
                })
                .await?;
            collection_ids.insert(title, collection.id);
            inserted += 1;
        }
    }

    let existing_products = tx.list_products(None).await?;
    for demo in &DEMO_PRODUCTS {
        if existing_products.iter().any(|p| p.title == demo.title) {
            skipped += 1;
            continue;
        }
        let collection_id = collection_ids
            .get(demo.collection)
            .copied()
            .ok_or_else(|| format!("demo product references unknown collection: {}", demo.collection))?;
        tx.insert_product(&NewProduct {
            title: demo.title.to_owned(),
            description: Some(demo.description.to_owned()),
            unit_price: Money::from_cents(demo.price_cents),
            inventory: demo.inventory,
            collection_id,
        })
        .await?;
        inserted += 1;
    }

    let existing_customers = tx.list_customers().await?;
    for demo in &DEMO_CUSTOMERS {
        if existing_customers
            .iter()
            .any(|c| c.email.as_str() == demo.email)
        {
            skipped += 1;
            continue;
        }
        tx.insert_customer(&NewCustomer {
            first_name: demo.first_name.to_owned(),
            last_name: demo.last_name.to_owned(),
            email: Email::parse(demo.email)?,
            phone: demo.phone.to_owned(),
            birth_date: None,
            membership: demo.membership,
        })
        .await?;
        inserted += 1;
    }

    tx.commit().await?;

    info!("Seeding complete!");
    info!("  Rows inserted: {inserted}");
    info!("  Rows skipped (already exist): {skipped}");

    Ok(())
}
