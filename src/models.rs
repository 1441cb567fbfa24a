use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Persisted Row ---

/// Drink
///
/// One row of the `drinks` table. `recipe` is kept as the serialized JSON text exactly as
/// stored; it is decoded into a `Recipe` only when a view is rendered.
#[derive(Debug, Clone, PartialEq, FromRow, Default)]
pub struct Drink {
    pub id: i32,
    // Unique across all drinks (enforced by the store).
    pub title: String,
    pub recipe: String,
}

impl Drink {
    /// Public view: ingredient names are withheld.
    pub fn short(&self) -> Result<DrinkShort, serde_json::Error> {
        let recipe = Recipe::from_stored(&self.recipe)?;
        Ok(DrinkShort {
            id: self.id,
            title: self.title.clone(),
            recipe: recipe
                .0
                .into_iter()
                .map(|ingredient| ShortIngredient {
                    color: ingredient.color,
                    parts: ingredient.parts,
                })
                .collect(),
        })
    }

    /// Full view for authorized consumers.
    pub fn long(&self) -> Result<DrinkLong, serde_json::Error> {
        let recipe = Recipe::from_stored(&self.recipe)?;
        Ok(DrinkLong {
            id: self.id,
            title: self.title.clone(),
            recipe: recipe.0,
        })
    }
}

// --- Recipe ---

/// Ingredient
///
/// A single recipe entry in canonical form. `parts` keeps the JSON number verbatim so an
/// integer posted by a client is returned as an integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Ingredient {
    pub color: String,
    pub name: String,
    #[ts(type = "number")]
    #[schema(value_type = f64)]
    pub parts: Number,
}

/// Recipe
///
/// Canonical recipe: an ordered list of ingredients, persisted as its JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Recipe(pub Vec<Ingredient>);

impl Recipe {
    /// Decodes the stored column text.
    pub fn from_stored(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serialized form written to the `recipe` column.
    pub fn to_stored(&self) -> String {
        // A Vec of plain structs with string keys cannot fail to serialize.
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    /// Normalizes a request-supplied recipe.
    ///
    /// Accepts a list of ingredients, a single ingredient object, or a string holding the JSON
    /// text of either (clients that serialize the recipe themselves). Returns `None` for any
    /// other shape.
    pub fn from_request(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => {
                let inner: Value = serde_json::from_str(text).ok()?;
                match inner {
                    // A string that decodes to another string is not a recipe.
                    Value::String(_) => None,
                    other => Self::from_request(&other),
                }
            }
            Value::Array(_) => serde_json::from_value(value.clone()).ok().map(Recipe),
            Value::Object(_) => serde_json::from_value::<Ingredient>(value.clone())
                .ok()
                .map(|ingredient| Recipe(vec![ingredient])),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// --- Views (Output Schemas) ---

/// ShortIngredient
///
/// Ingredient as exposed on the public listing: no `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ShortIngredient {
    pub color: String,
    #[ts(type = "number")]
    #[schema(value_type = f64)]
    pub parts: Number,
}

/// DrinkShort
///
/// `GET /drinks` representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DrinkShort {
    pub id: i32,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

/// DrinkLong
///
/// Full representation returned by the protected routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DrinkLong {
    pub id: i32,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// DrinksResponse
///
/// Success envelope shared by the list, create and update routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    pub fn new(drinks: Vec<T>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

/// DeleteResponse
///
/// Success envelope for `DELETE /drinks/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    pub delete: i32,
}

// --- Request Payloads (Input Schemas) ---

/// CreateDrinkRequest
///
/// Body of `POST /drinks`. Both fields are required; they are declared optional here so that
/// a missing field surfaces as a 400 from the handler rather than a deserializer rejection.
/// `recipe` stays untyped until `Recipe::from_request` normalizes it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateDrinkRequest {
    pub title: Option<String>,
    #[schema(value_type = Object)]
    pub recipe: Option<Value>,
}

/// UpdateDrinkRequest
///
/// Partial update body of `PATCH /drinks/{id}`. Absent or empty fields leave the column as is.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateDrinkRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub recipe: Option<Value>,
}
