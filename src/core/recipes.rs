//! Recipe catalog: resolves a multiset of ingredient names to a recipe.
//!
//! Matching is exact multiset equality over normalized names (trimmed,
//! lowercased). Ingredient order never matters, repeat counts always do.

use super::errors::ShopError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Normalized ingredient name -> required count
pub type IngredientCounts = BTreeMap<String, usize>;

/// Normalize a single item or ingredient name for comparison
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Case and whitespace insensitive name comparison
pub fn names_match(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}

/// Group names into a frequency map. Returns None if any name is blank.
pub fn ingredient_counts<S: AsRef<str>>(names: &[S]) -> Option<IngredientCounts> {
    let mut counts = IngredientCounts::new();
    for name in names {
        let normalized = normalize_name(name.as_ref());
        if normalized.is_empty() {
            return None;
        }
        *counts.entry(normalized).or_insert(0) += 1;
    }
    Some(counts)
}

/// An immutable potion recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    /// Display name; also the name of the potion this recipe brews
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Required ingredients, repeats allowed, order irrelevant
    pub ingredients: Vec<String>,
    /// Handle the presentation layer uses to show the result
    #[serde(default)]
    pub visual: String,
}

impl Recipe {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        ingredients: Vec<String>,
        visual: impl Into<String>,
    ) -> Result<Self, ShopError> {
        let recipe = Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            ingredients,
            visual: visual.into(),
        };
        recipe.validate()?;
        Ok(recipe)
    }

    pub fn validate(&self) -> Result<(), ShopError> {
        if self.id.trim().is_empty() {
            return Err(ShopError::InvalidRecipe("recipe id is empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(ShopError::InvalidRecipe(format!(
                "recipe '{}' has no name",
                self.id
            )));
        }
        if self.ingredients.is_empty() {
            return Err(ShopError::InvalidRecipe(format!(
                "recipe '{}' has no ingredients",
                self.id
            )));
        }
        if ingredient_counts(self.ingredients.as_slice()).is_none() {
            return Err(ShopError::InvalidRecipe(format!(
                "recipe '{}' has a blank ingredient name",
                self.id
            )));
        }
        Ok(())
    }
}

/// What comes out of the cauldron
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brew {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub visual: String,
    /// Set when a recipe matched
    #[serde(skip)]
    pub recipe_id: Option<String>,
}

impl Brew {
    pub fn failed_potion() -> Self {
        Self {
            name: "Failed Potion".to_string(),
            description: "A murky sludge. Nobody wants to buy this.".to_string(),
            visual: "failed_potion".to_string(),
            recipe_id: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.recipe_id.is_none()
    }
}

impl From<&Recipe> for Brew {
    fn from(recipe: &Recipe) -> Self {
        Self {
            name: recipe.name.clone(),
            description: recipe.description.clone(),
            visual: recipe.visual.clone(),
            recipe_id: Some(recipe.id.clone()),
        }
    }
}

/// On-disk layout of a recipe catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub failed_potion: Option<Brew>,
    pub recipes: Vec<Recipe>,
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    recipe: Arc<Recipe>,
    counts: IngredientCounts,
    total: usize,
}

/// Static recipe lookup, loaded once at startup
#[derive(Debug, Clone)]
pub struct RecipeCatalog {
    entries: Vec<CatalogEntry>,
    failed_potion: Brew,
}

impl RecipeCatalog {
    /// Build a catalog. Rejects duplicate ids and recipes whose ingredient
    /// multisets collide, so lookup never depends on catalog order.
    pub fn new(recipes: Vec<Recipe>) -> Result<Self, ShopError> {
        let mut entries: Vec<CatalogEntry> = Vec::with_capacity(recipes.len());
        let mut ids = HashSet::new();

        for recipe in recipes {
            recipe.validate()?;
            if !ids.insert(recipe.id.clone()) {
                return Err(ShopError::DuplicateRecipe {
                    first: recipe.id.clone(),
                    second: recipe.id,
                });
            }

            let counts = ingredient_counts(recipe.ingredients.as_slice()).ok_or_else(|| {
                ShopError::InvalidRecipe(format!("recipe '{}' has a blank ingredient", recipe.id))
            })?;
            if let Some(existing) = entries.iter().find(|e| e.counts == counts) {
                return Err(ShopError::DuplicateRecipe {
                    first: existing.recipe.id.clone(),
                    second: recipe.id,
                });
            }

            let total = recipe.ingredients.len();
            entries.push(CatalogEntry {
                recipe: Arc::new(recipe),
                counts,
                total,
            });
        }

        Ok(Self {
            entries,
            failed_potion: Brew::failed_potion(),
        })
    }

    /// Load a catalog from its JSON representation
    pub fn from_json_str(json: &str) -> Result<Self, ShopError> {
        let data: CatalogData = serde_json::from_str(json)?;
        let catalog = Self::new(data.recipes)?;
        Ok(match data.failed_potion {
            Some(failed) => catalog.with_failed_potion(failed),
            None => catalog,
        })
    }

    /// Replace the canonical result used when nothing matches
    pub fn with_failed_potion(mut self, mut failed: Brew) -> Self {
        failed.recipe_id = None;
        self.failed_potion = failed;
        self
    }

    /// Find the recipe whose ingredient multiset equals `ingredients`.
    /// Empty input or a blank name never matches.
    pub fn find_recipe<S: AsRef<str>>(&self, ingredients: &[S]) -> Option<Arc<Recipe>> {
        if ingredients.is_empty() {
            return None;
        }
        let query = ingredient_counts(ingredients)?;
        let total = ingredients.len();

        self.entries
            .iter()
            .find(|entry| {
                entry.total == total
                    && entry.counts.len() == query.len()
                    && entry.counts == query
            })
            .map(|entry| Arc::clone(&entry.recipe))
    }

    /// Like `find_recipe` but reports a miss as an error
    pub fn require_recipe<S: AsRef<str>>(&self, ingredients: &[S]) -> Result<Arc<Recipe>, ShopError> {
        self.find_recipe(ingredients).ok_or_else(|| {
            ShopError::RecipeNotFound(ingredients.iter().map(|s| s.as_ref().to_string()).collect())
        })
    }

    /// Brew the given ingredients; a miss yields the failed potion
    pub fn brew<S: AsRef<str>>(&self, ingredients: &[S]) -> Brew {
        match self.require_recipe(ingredients) {
            Ok(recipe) => {
                debug!("[Catalog] Brewed '{}'", recipe.name);
                Brew::from(recipe.as_ref())
            }
            Err(err) => {
                warn!("[Catalog] {} - substituting '{}'", err, self.failed_potion.name);
                self.failed_potion.clone()
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Recipe>> {
        self.entries
            .iter()
            .find(|entry| entry.recipe.id == id)
            .map(|entry| Arc::clone(&entry.recipe))
    }

    /// Resolve a list of recipe ids, failing on the first unknown one
    pub fn resolve_ids(&self, ids: &[String]) -> Result<Vec<Arc<Recipe>>, ShopError> {
        ids.iter()
            .map(|id| self.get(id).ok_or_else(|| ShopError::UnknownRecipe(id.clone())))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Recipe>> {
        self.entries.iter().map(|entry| &entry.recipe)
    }

    pub fn failed_potion(&self) -> &Brew {
        &self.failed_potion
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
