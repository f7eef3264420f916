use super::customer::CustomerState;
use super::types::CustomerId;

/// Errors reported by the shop core.
///
/// None of these are fatal: the caller gets a diagnostic and the core has
/// already fallen back to a safe state.
#[derive(Debug, Clone, PartialEq)]
pub enum ShopError {
    /// A required piece of configuration (order pool, exit point, archetype) is absent
    ConfigurationMissing(String),
    /// An action was attempted in a state that does not accept it
    InvalidStateTransition {
        customer: CustomerId,
        state: CustomerState,
        action: &'static str,
    },
    /// Window release signalled by a customer that does not hold the window
    StaleNotification(CustomerId),
    /// No recipe matches the given ingredients
    RecipeNotFound(Vec<String>),
    /// A recipe violates the catalog invariants
    InvalidRecipe(String),
    /// Two recipes share an id or an ingredient multiset
    DuplicateRecipe { first: String, second: String },
    /// A configured order pool names a recipe the catalog does not have
    UnknownRecipe(String),
    /// The customer is not tracked by the manager
    UnknownCustomer(CustomerId),
    /// The shop cannot open while it is night
    ClosedForNight,
    /// Configuration values out of range
    InvalidConfig(String),
    /// JSON input could not be parsed
    Parse(String),
}

impl std::fmt::Display for ShopError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShopError::ConfigurationMissing(msg) => write!(f, "Configuration missing: {}", msg),
            ShopError::InvalidStateTransition {
                customer,
                state,
                action,
            } => write!(
                f,
                "Invalid state transition: customer {} cannot {} while {:?}",
                customer, action, state
            ),
            ShopError::StaleNotification(id) => {
                write!(f, "Stale notification from customer {} not at the window", id)
            }
            ShopError::RecipeNotFound(ingredients) => {
                write!(f, "No recipe matches [{}]", ingredients.join(", "))
            }
            ShopError::InvalidRecipe(msg) => write!(f, "Invalid recipe: {}", msg),
            ShopError::DuplicateRecipe { first, second } => write!(
                f,
                "Recipes '{}' and '{}' collide in the catalog",
                first, second
            ),
            ShopError::UnknownRecipe(id) => write!(f, "Unknown recipe id '{}'", id),
            ShopError::UnknownCustomer(id) => write!(f, "Unknown customer {}", id),
            ShopError::ClosedForNight => write!(f, "The shop cannot open at night"),
            ShopError::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            ShopError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for ShopError {}

impl From<serde_json::Error> for ShopError {
    fn from(err: serde_json::Error) -> Self {
        ShopError::Parse(err.to_string())
    }
}
