//! Demonstration listings written into an empty collection on first run.

use super::model::{Category, Listing, ListingStatus};
use super::price::Price;

struct SeedRow {
    title: &'static str,
    author: &'static str,
    image_seed: &'static str,
    likes: u64,
    views: u64,
    category: Category,
    description: &'static str,
    price: &'static str,
    sales: u64,
    earnings: f64,
    file_url: &'static str,
}

const SEED_ROWS: [SeedRow; 12] = [
    SeedRow {
        title: "Cyberpunk Portfolio",
        author: "NexusDesigns",
        image_seed: "template1",
        likes: 1340,
        views: 25000,
        category: Category::Portfolio,
        description: "A dark, futuristic portfolio template with neon accents, perfect for developers and digital artists.",
        price: "$49",
        sales: 120,
        earnings: 5880.0,
        file_url: "https://example.com",
    },
    SeedRow {
        title: "SaaS Landing Page",
        author: "PixelPerfect",
        image_seed: "template2",
        likes: 2100,
        views: 42000,
        category: Category::Saas,
        description: "Clean and modern landing page for a software-as-a-service product, focusing on conversions.",
        price: "Free",
        sales: 0,
        earnings: 0.0,
        file_url: "https://ui.shadcn.com/",
    },
    SeedRow {
        title: "Crypto Dashboard",
        author: "ChainUI",
        image_seed: "template3",
        likes: 980,
        views: 18000,
        category: Category::Dashboard,
        description: "A comprehensive dashboard for tracking cryptocurrency prices and managing portfolios.",
        price: "$89",
        sales: 45,
        earnings: 4005.0,
        file_url: "https://coinmarketcap.com/",
    },
    SeedRow {
        title: "E-commerce Store",
        author: "ShopifyMasters",
        image_seed: "template4",
        likes: 5600,
        views: 112000,
        category: Category::ECommerce,
        description: "A minimalist and elegant e-commerce template designed to showcase products beautifully.",
        price: "$120",
        sales: 310,
        earnings: 37200.0,
        file_url: "https://shopify.com",
    },
    SeedRow {
        title: "AI Startup Pitch",
        author: "FutureVision",
        image_seed: "template5",
        likes: 3250,
        views: 61000,
        category: Category::Saas,
        description: "A compelling pitch deck template for AI and tech startups, designed to impress investors.",
        price: "Free",
        sales: 0,
        earnings: 0.0,
        file_url: "https://openai.com",
    },
    SeedRow {
        title: "Gaming Community Hub",
        author: "GlitchWorks",
        image_seed: "template6",
        likes: 4100,
        views: 98000,
        category: Category::Community,
        description: "An engaging hub for gaming communities, featuring forums, member profiles, and event calendars.",
        price: "$35",
        sales: 85,
        earnings: 2975.0,
        file_url: "https://discord.com",
    },
    SeedRow {
        title: "Minimalist Blog",
        author: "Wordsmith",
        image_seed: "template7",
        likes: 1800,
        views: 35000,
        category: Category::Blog,
        description: "A content-focused blog template with beautiful typography and a clean, distraction-free reading experience.",
        price: "Free",
        sales: 0,
        earnings: 0.0,
        file_url: "https://vercel.com/templates",
    },
    SeedRow {
        title: "Digital Agency",
        author: "CreativeFlow",
        image_seed: "template8",
        likes: 2900,
        views: 54000,
        category: Category::Portfolio,
        description: "A professional and stylish template for digital agencies to showcase their work and services.",
        price: "$200",
        sales: 15,
        earnings: 3000.0,
        file_url: "#",
    },
    SeedRow {
        title: "Fitness App UI",
        author: "FitDesign",
        image_seed: "template9",
        likes: 3500,
        views: 72000,
        category: Category::Dashboard,
        description: "A vibrant and motivating UI kit for a fitness tracking application, with charts and progress trackers.",
        price: "$55",
        sales: 60,
        earnings: 3300.0,
        file_url: "#",
    },
    SeedRow {
        title: "Recipe Sharing Platform",
        author: "CooksCorner",
        image_seed: "template10",
        likes: 2400,
        views: 48000,
        category: Category::Community,
        description: "A community-driven platform for sharing and discovering new recipes, with user ratings and collections.",
        price: "Free",
        sales: 0,
        earnings: 0.0,
        file_url: "#",
    },
    SeedRow {
        title: "Tech Conference Event",
        author: "EventPro",
        image_seed: "template11",
        likes: 1500,
        views: 31000,
        category: Category::Community,
        description: "A sleek and informative one-page template for tech conferences and events, with speaker profiles and schedules.",
        price: "$25",
        sales: 40,
        earnings: 1000.0,
        file_url: "#",
    },
    SeedRow {
        title: "Photography Portfolio",
        author: "Shutterbug",
        image_seed: "template12",
        likes: 4800,
        views: 95000,
        category: Category::Portfolio,
        description: "A visually stunning portfolio for photographers, featuring fullscreen image galleries and elegant transitions.",
        price: "$75",
        sales: 150,
        earnings: 11250.0,
        file_url: "#",
    },
];

/// Number of demonstration listings.
pub const DEMO_LISTING_COUNT: usize = SEED_ROWS.len();

/// The demonstration listings, oldest first, without ids.
pub fn demo_listings() -> Vec<Listing> {
    SEED_ROWS
        .iter()
        .map(|row| Listing {
            id: String::new(),
            title: row.title.to_string(),
            author: row.author.to_string(),
            image_url: format!("https://picsum.photos/seed/{}/600/400", row.image_seed),
            category: row.category,
            description: row.description.to_string(),
            price: Price::from(row.price.to_string()),
            status: ListingStatus::Approved,
            likes: row.likes,
            views: row.views,
            sales: row.sales,
            earnings: row.earnings,
            file_url: Some(row.file_url.to_string()),
            file_name: None,
            file_type: None,
            created_at: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_set_is_complete_and_approved() {
        let listings = demo_listings();
        assert_eq!(listings.len(), DEMO_LISTING_COUNT);
        assert!(listings.iter().all(|l| l.status == ListingStatus::Approved));
        assert!(listings.iter().all(|l| l.id.is_empty()));
        assert_eq!(listings[0].title, "Cyberpunk Portfolio");
        assert!(listings[1].price.is_free());
    }
}
