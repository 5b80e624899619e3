//! Name vocabularies for type and semantic inference.
//!
//! Terms match on `_`-bounded words of a snake_case column name, so
//! `unit_price` matches `price` but `priceless` does not.

use sheetwise_foundation::SemanticType;

/// Column names implying money amounts.
pub const CURRENCY: &[&str] = &[
    "price", "cost", "amount", "total", "subtotal", "revenue", "salary", "fee", "payment",
    "balance", "tax", "spend", "budget", "income", "expense", "usd", "eur",
];

/// Column names implying percentages.
pub const PERCENTAGE: &[&str] = &[
    "percent", "percentage", "pct", "rate", "ratio", "margin", "discount", "share", "growth",
];

/// Value sets that make a column boolean, compared lower-cased.
pub const BOOLEAN_SETS: &[&[&str]] = &[
    &["true", "false"],
    &["yes", "no"],
    &["y", "n"],
    &["0", "1"],
    &["t", "f"],
];

/// Exact names of a primary key.
pub const PRIMARY_KEY_NAMES: &[&str] = &["id", "pk", "key", "uuid", "guid"];

const NAME: &[&str] = &["name", "title", "label", "full_name"];
const DESCRIPTION: &[&str] = &[
    "description", "desc", "notes", "note", "comment", "comments", "details", "remarks",
];
const STATUS: &[&str] = &["status", "stage", "phase"];
const QUANTITY: &[&str] = &["quantity", "qty", "stock", "units", "count", "on_hand", "inventory"];
const PRICE: &[&str] = &["price", "cost", "amount", "fee", "subtotal", "total"];
const DATE_CREATED: &[&str] = &["created", "creation", "created_at", "date_created", "added", "registered"];
const DATE_MODIFIED: &[&str] = &["modified", "updated", "updated_at", "last_modified", "changed", "edited"];
const EMAIL: &[&str] = &["email", "e_mail", "mail"];
const PHONE: &[&str] = &["phone", "telephone", "tel", "mobile", "cell", "fax"];
const ADDRESS: &[&str] = &[
    "address", "street", "city", "zip", "zipcode", "postcode", "postal", "country",
];

/// True if `term` appears in `name` as a run of whole `_`-separated words.
#[must_use]
pub fn contains_words(name: &str, term: &str) -> bool {
    if name == term {
        return true;
    }
    let padded = format!("_{name}_");
    padded.contains(&format!("_{term}_"))
}

/// True if any term of the vocabulary matches the name.
#[must_use]
pub fn matches_any(name: &str, vocabulary: &[&str]) -> bool {
    vocabulary.iter().any(|term| contains_words(name, term))
}

/// Infers a semantic type from a snake_case column name.
///
/// `owner` is the singular snake_case name of the entity the column belongs
/// to; `{owner}_id` is that entity's own key, not a foreign key.
#[must_use]
pub fn infer_semantic(name: &str, owner: Option<&str>) -> Option<SemanticType> {
    if PRIMARY_KEY_NAMES.contains(&name) {
        return Some(SemanticType::PrimaryKey);
    }
    if let Some(prefix) = name.strip_suffix("_id").filter(|p| !p.is_empty()) {
        if owner.is_some_and(|o| o == prefix) {
            return Some(SemanticType::PrimaryKey);
        }
        return Some(SemanticType::ForeignKey(prefix.to_string()));
    }

    let ordered: [(&[&str], SemanticType); 10] = [
        (NAME, SemanticType::Name),
        (DESCRIPTION, SemanticType::Description),
        (STATUS, SemanticType::Status),
        (QUANTITY, SemanticType::Quantity),
        (PRICE, SemanticType::Price),
        (DATE_CREATED, SemanticType::DateCreated),
        (DATE_MODIFIED, SemanticType::DateModified),
        (EMAIL, SemanticType::Email),
        (PHONE, SemanticType::Phone),
        (ADDRESS, SemanticType::Address),
    ];
    ordered
        .into_iter()
        .find(|(vocabulary, _)| matches_any(name, vocabulary))
        .map(|(_, semantic)| semantic)
}
