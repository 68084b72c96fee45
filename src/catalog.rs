//! Pre-built agent catalog and its category/search filter.

use axum::extract::Query;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Customer,
    Sales,
    Analytics,
    Productivity,
    Operations,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::All,
        Self::Customer,
        Self::Sales,
        Self::Analytics,
        Self::Productivity,
        Self::Operations,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All Agents",
            Self::Customer => "Customer Service",
            Self::Sales => "Sales & Marketing",
            Self::Analytics => "Analytics",
            Self::Productivity => "Productivity",
            Self::Operations => "Operations",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogAgent {
    pub id: u32,
    pub name: &'static str,
    pub category: Category,
    pub description: &'static str,
    pub capabilities: [&'static str; 3],
}

const fn agent(
    id: u32,
    name: &'static str,
    category: Category,
    description: &'static str,
    capabilities: [&'static str; 3],
) -> CatalogAgent {
    CatalogAgent {
        id,
        name,
        category,
        description,
        capabilities,
    }
}

pub static AGENTS: [CatalogAgent; 12] = [
    agent(1, "Support Hero", Category::Customer, "Handles customer inquiries 24/7.",
        ["Instant responses", "Multi-language support", "Ticket routing"]),
    agent(2, "Sales Accelerator", Category::Sales, "Qualifies leads and books meetings.",
        ["Lead scoring", "Calendar integration", "Follow-up automation"]),
    agent(3, "Data Insight", Category::Analytics, "Analyzes trends and generates reports.",
        ["Real-time dashboards", "Predictive analytics", "Custom reports"]),
    agent(4, "Email Assistant", Category::Productivity, "Drafts, schedules, and prioritizes emails.",
        ["Smart drafting", "Priority sorting", "Auto-scheduling"]),
    agent(5, "Content Creator", Category::Sales, "Generates marketing copy and social posts.",
        ["SEO optimization", "Brand voice matching", "Multi-platform"]),
    agent(6, "Meeting Coordinator", Category::Productivity, "Schedules meetings and sends reminders.",
        ["Calendar sync", "Timezone detection", "Automated reminders"]),
    agent(7, "Code Reviewer", Category::Operations, "Reviews code and suggests improvements.",
        ["Bug detection", "Best practices", "Security scanning"]),
    agent(8, "Invoice Manager", Category::Operations, "Processes invoices and tracks payments.",
        ["Auto-extraction", "Payment tracking", "Expense categorization"]),
    agent(9, "Feedback Analyzer", Category::Analytics, "Synthesizes customer feedback into insights.",
        ["Sentiment analysis", "Trend detection", "Action recommendations"]),
    agent(10, "Onboarding Guide", Category::Customer, "Walks new users through setup.",
        ["Interactive tutorials", "Progress tracking", "Personalized paths"]),
    agent(11, "Document Processor", Category::Operations, "Extracts and organizes document data.",
        ["OCR scanning", "Auto-filing", "Data extraction"]),
    agent(12, "Social Monitor", Category::Sales, "Tracks brand mentions and engagement.",
        ["Real-time monitoring", "Sentiment tracking", "Auto-responses"]),
];

/// Agents in `category` whose name or description contains `search`,
/// ignoring case. An empty search matches everything.
pub fn filter(category: Category, search: &str) -> Vec<&'static CatalogAgent> {
    let needle = search.to_lowercase();
    AGENTS
        .iter()
        .filter(|a| category == Category::All || a.category == category)
        .filter(|a| {
            a.name.to_lowercase().contains(&needle)
                || a.description.to_lowercase().contains(&needle)
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct CatalogQuery {
    #[serde(default)]
    category: Category,
    #[serde(default)]
    q: String,
}

/// GET /api/catalog?category=sales&q=lead
async fn list(Query(query): Query<CatalogQuery>) -> Json<serde_json::Value> {
    let agents = filter(query.category, &query.q);
    let categories: Vec<_> = Category::ALL
        .iter()
        .map(|c| serde_json::json!({ "id": c, "name": c.label() }))
        .collect();
    Json(serde_json::json!({
        "categories": categories,
        "agents": agents,
    }))
}

pub fn catalog_routes() -> Router {
    Router::new().route("/api/catalog", get(list))
}
