//! Built-in sensitive-topic table and canned texts.
//!
//! File: cli/src/common/screening/defaults.rs
//!
//! Categories are listed in scan order; the first category with a matching
//! keyword wins, so order matters where phrases overlap (e.g. "government
//! investigation" in Legal & Compliance before "investigation" in Negative
//! Reputation).

/// Greeting phrases that get the fixed greeting reply. Compared against the
/// whole trimmed, lower-cased query.
pub const GREETINGS: &[&str] = &["hi", "hello", "hey", "good morning", "good evening"];

pub const GREETING_REPLY: &str = "Hello! How can I assist you today?";

// The leading space is part of the reply clients have always received.
pub const REFUSAL_REPLY: &str = " I can't provide a response. I will connect you to a human agent.";

/// `(category name, keywords)` in scan order.
pub const SENSITIVE_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Financial & Business Information",
        &[
            "revenue",
            "profit margin",
            "financial statements",
            "valuation",
            "charges",
            "cost",
            "payout",
            "charge",
            "budget",
            "expenses",
            "investment",
            "operating costs",
            "r&d spending",
            "cash flow",
            "ebitda",
            "earnings",
        ],
    ),
    (
        "Legal & Compliance Issues",
        &[
            "lawsuit",
            "court order",
            "policy violation",
            "nda",
            "regulation",
            "compliance",
            "settlement",
            "litigation",
            "legal dispute",
            "government investigation",
            "intellectual property",
            "copyright",
            "patent",
            "policies",
        ],
    ),
    (
        "Employee & HR Data",
        &[
            "salary",
            "compensation",
            "benefits",
            "layoffs",
            "employee records",
            "performance reviews",
            "personal data",
            "hr policies",
            "hiring practices",
            "payroll",
            "bonus",
            "severance",
            "workforce",
        ],
    ),
    (
        "Security & Data Breach",
        &[
            "cyber attack",
            "hacked",
            "data breach",
            "password leak",
            "malware",
            "ransomware",
            "security incident",
            "vulnerability",
            "phishing",
            "ddos",
            "unauthorized access",
            "encryption",
        ],
    ),
    (
        "Negative Reputation & Crisis Management",
        &[
            "scandal",
            "fraud",
            "public backlash",
            "ceo resignation",
            "misconduct",
            "reputation damage",
            "media crisis",
            "negative press",
            "customer complaints",
            "bad reviews",
            "investigation",
            "corruption",
        ],
    ),
    (
        "Operational & Strategic Information",
        &[
            "business strategy",
            "market analysis",
            "competitive analysis",
            "operational efficiency",
            "internal processes",
            "supply chain",
            "inventory levels",
            "logistics",
            "strategic planning",
            "operational metrics",
            "business plan",
            "parcing",
            "pricing",
        ],
    ),
    (
        "Product & Service Information",
        &[
            "product roadmap",
            "support",
            "service pricing",
            "product features",
            "proprietary technology",
            "innovation",
            "research findings",
            "development plans",
            "technical specifications",
            "beta testing",
            "feature updates",
            "roadmap",
            "product backlog",
        ],
    ),
    (
        "Customer & Client Data",
        &[
            "customer lists",
            "client contracts",
            "usage statistics",
            "feedback",
            "purchase history",
            "loyalty programs",
            "personal information",
            "email addresses",
            "phone numbers",
            "crm data",
            "human",
        ],
    ),
    (
        "Vendor & Partner Information",
        &[
            "supplier agreements",
            "partnership contracts",
            "vendor pricing",
            "service level agreements",
            "outsourcing",
            "third-party contracts",
            "procurement",
            "distributor agreements",
        ],
    ),
];
