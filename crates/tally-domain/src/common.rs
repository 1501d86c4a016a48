//! Shared traits and the monetary representation used across the engine.

use rust_decimal::Decimal;
use uuid::Uuid;

/// Monetary amount. Full precision is kept; rounding happens only for display.
pub type Money = Decimal;

/// Exposes a stable identifier for entities stored in a company.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}
