use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

/// Result snippet class used by the search engine's lightweight HTML page.
const SNIPPET_SELECTOR: &str = "div.BNeawe.iBp4i.AP7Wnd";
const MISSING_VALUE: &str = "0 g";

/// Unnormalized nutrient strings, e.g. `"4.3 g"` or `"52 kcal"`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNutrition {
    pub proteins: String,
    pub calories: String,
    pub carbohydrates: String,
    pub fat: String,
    pub sugar: String,
}

impl Default for RawNutrition {
    fn default() -> Self {
        RawNutrition {
            proteins: MISSING_VALUE.to_string(),
            calories: MISSING_VALUE.to_string(),
            carbohydrates: MISSING_VALUE.to_string(),
            fat: MISSING_VALUE.to_string(),
            sugar: MISSING_VALUE.to_string(),
        }
    }
}

/// Source of nutrition values for foods missing from the local table.
#[async_trait]
pub trait NutritionLookup: Send + Sync {
    /// `None` means the source could not be reached at all.
    async fn lookup_nutrition(&self, name: &str) -> Option<RawNutrition>;
}

/// Best-effort lookup that scrapes the first answer snippet of a web search.
pub struct SearchScraper {
    client: Client,
    search_url: String,
}

impl SearchScraper {
    pub fn new(client: Client, search_url: impl Into<String>) -> Self {
        SearchScraper {
            client,
            search_url: search_url.into(),
        }
    }

    /// Snippet for one nutrient query. A failed request yields `None` so the
    /// other nutrients survive it.
    async fn search(&self, nutrient: &str, food: &str) -> Option<String> {
        let query = format!("{} in {}", nutrient, food);
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("q", query.as_str())])
            .send()
            .await
            .and_then(|response| response.error_for_status());

        let html = match response {
            Ok(response) => response.text().await,
            Err(err) => Err(err),
        };

        match html {
            Ok(html) => Some(extract_snippet(&html).unwrap_or_else(|| MISSING_VALUE.to_string())),
            Err(err) => {
                tracing::warn!(%query, error = %err, "nutrition search failed");
                None
            }
        }
    }
}

#[async_trait]
impl NutritionLookup for SearchScraper {
    async fn lookup_nutrition(&self, name: &str) -> Option<RawNutrition> {
        let (proteins, calories, carbohydrates, fat, sugar) = tokio::join!(
            self.search("proteins", name),
            self.search("calories", name),
            self.search("carbohydrate", name),
            self.search("fat", name),
            self.search("sugar", name),
        );

        if [&proteins, &calories, &carbohydrates, &fat, &sugar]
            .iter()
            .all(|value| value.is_none())
        {
            tracing::warn!(food = name, "search engine unreachable for every nutrient");
            return None;
        }

        let or_missing = |value: Option<String>| value.unwrap_or_else(|| MISSING_VALUE.to_string());
        Some(RawNutrition {
            proteins: or_missing(proteins),
            calories: or_missing(calories),
            carbohydrates: or_missing(carbohydrates),
            fat: or_missing(fat),
            sugar: or_missing(sugar),
        })
    }
}

/// Text of the first snippet element, if the page has one.
pub fn extract_snippet(html: &str) -> Option<String> {
    let selector = Selector::parse(SNIPPET_SELECTOR).ok()?;
    let document = Html::parse_document(html);
    let element = document.select(&selector).next()?;
    let text = element.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}
