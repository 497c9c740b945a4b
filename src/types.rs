//! Storefront catalog types as returned by the public JSON API

use serde::Deserialize;

/// Response body of `GET /collections.json`
#[derive(Debug, Deserialize)]
pub struct CollectionsResponse {
    pub collections: Vec<Collection>,
}

/// Response body of `GET /collections/{handle}/products.json`
#[derive(Debug, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

/// A named grouping of products
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Collection {
    pub title: String,
    /// URL-safe identifier, also used as the image folder name and CSS class
    pub handle: String,
    #[serde(default)]
    pub products_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    pub title: String,
    pub handle: String,
    /// Raw markup, embedded into the page as-is
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body_html: String,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductImage {
    pub src: String,
}

impl Product {
    /// Local file name for the image at `index`: `{handle}_{index}.jpg`
    pub fn image_filename(&self, index: usize) -> String {
        format!("{}_{}.jpg", self.handle, index)
    }

    pub fn image_urls(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(|img| img.src.as_str())
    }
}

/// True when `handle` names exactly one path component (no separators, no `..`)
pub fn is_safe_handle(handle: &str) -> bool {
    !handle.is_empty()
        && handle != "."
        && !handle.contains("..")
        && !handle.contains(['/', '\\', ':', '\0'])
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collections_ignore_unknown_fields() {
        let json = r#"{"collections": [
            {"id": 1, "title": "Puzzles", "handle": "puzzles", "products_count": 12, "published_at": "2024-01-01"}
        ]}"#;
        let parsed: CollectionsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.collections,
            vec![Collection {
                title: "Puzzles".to_string(),
                handle: "puzzles".to_string(),
                products_count: 12,
            }]
        );
    }

    #[test]
    fn test_product_null_body_and_missing_images() {
        let json = r#"{"products": [{"title": "Cube", "handle": "cube", "body_html": null}]}"#;
        let parsed: ProductsResponse = serde_json::from_str(json).unwrap();
        let product = &parsed.products[0];
        assert_eq!(product.body_html, "");
        assert!(product.images.is_empty());
    }

    #[test]
    fn test_safe_handles() {
        assert!(is_safe_handle("six-piece-burr"));
        assert!(is_safe_handle("puzzles_2024"));
        assert!(!is_safe_handle(""));
        assert!(!is_safe_handle("."));
        assert!(!is_safe_handle(".."));
        assert!(!is_safe_handle("../../x"));
        assert!(!is_safe_handle("/etc"));
        assert!(!is_safe_handle("a/b"));
        assert!(!is_safe_handle("a\\b"));
        assert!(!is_safe_handle("C:x"));
    }

    #[test]
    fn test_image_filename() {
        let product = Product {
            title: "Burr".to_string(),
            handle: "six-piece-burr".to_string(),
            body_html: String::new(),
            images: vec![
                ProductImage { src: "https://cdn.example.com/a.png?v=1".to_string() },
                ProductImage { src: "https://cdn.example.com/b.png".to_string() },
            ],
        };
        assert_eq!(product.image_filename(0), "six-piece-burr_0.jpg");
        assert_eq!(product.image_filename(1), "six-piece-burr_1.jpg");
        assert_eq!(product.image_urls().count(), 2);
    }
}
