use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{Collection, Product};

pub const IMAGES_DIR: &str = "images";
pub const INDEX_FILE: &str = "index.html";

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Relative path of a product image as referenced from index.html
pub fn image_href(collection_handle: &str, filename: &str) -> String {
    format!("{}/{}/{}", IMAGES_DIR, collection_handle, filename)
}

/// CSS styles for the page
fn css_styles() -> &'static str {
    r#"
        .collection-filter {
            margin-bottom: 20px;
        }
        .collection-buttons {
            display: flex;
            flex-wrap: wrap;
            gap: 10px;
        }
        .collection-button {
            padding: 10px;
            background-color: #007BFF;
            color: white;
            border: none;
            cursor: pointer;
            border-radius: 5px;
        }
        .product-list {
            display: flex;
            flex-wrap: wrap;
        }
        .product {
            width: 30%;
            margin: 10px;
            padding: 10px;
            border: 1px solid #ddd;
            transition: transform 0.2s;
        }
        .product:hover {
            transform: scale(1.05);
        }
        .product img {
            max-width: 100%;
            height: auto;
            cursor: pointer;
        }
"#
}

/// Show only the products carrying the clicked button's collection class
fn filter_script() -> &'static str {
    r#"
<script>
    const collectionButtons = document.querySelectorAll(".collection-button");
    const products = document.querySelectorAll(".product");

    collectionButtons.forEach(button => {
        button.addEventListener("click", () => {
            const collectionHandle = button.getAttribute("data-collection");
            products.forEach(product => {
                if (product.classList.contains(collectionHandle)) {
                    product.style.display = "block";
                } else {
                    product.style.display = "none";
                }
            });
        });
    });
</script>
"#
}

/// Filter button for one collection, labelled with its declared product count
pub fn collection_button_html(collection: &Collection) -> String {
    format!(
        r#"<button class="collection-button" data-collection="{}">{} ({})</button>"#,
        collection.handle, collection.title, collection.products_count
    )
}

/// Product card. Title and body are scraped markup and go in unescaped.
pub fn product_card_html(collection_handle: &str, product: &Product) -> String {
    let gallery: String = (0..product.images.len())
        .map(|i| {
            let href = image_href(collection_handle, &product.image_filename(i));
            format!(
                r#"
                <a href="{}" target="_blank">
                    <img src="{}" alt="{}" width="100" height="100">
                </a>"#,
                href, href, product.title
            )
        })
        .collect();

    format!(
        r#"
            <div class="product {}">
                <h3>{}</h3>
                <p>{}</p>
                <div class="image-gallery">{}
                </div>
            </div>"#,
        collection_handle, product.title, product.body_html, gallery
    )
}

/// Accumulates the single-page document while the scrape runs
pub struct PageBuilder {
    html: String,
}

impl PageBuilder {
    /// Start the document: head, title and one filter button per collection
    pub fn new(title: &str, collections: &[Collection]) -> Self {
        let title = html_escape(title);
        let mut html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{}</title>
    <style>{}    </style>
</head>
<body>
    <h1>{}</h1>
    <div class="collection-filter">
        <div class="collection-buttons">
"#,
            title,
            css_styles(),
            title
        );

        for collection in collections {
            html.push_str("            ");
            html.push_str(&collection_button_html(collection));
            html.push('\n');
        }

        html.push_str(
            r#"        </div>
    </div>
    <div class="product-list">"#,
        );

        Self { html }
    }

    pub fn push_product(&mut self, collection_handle: &str, product: &Product) {
        self.html
            .push_str(&product_card_html(collection_handle, product));
    }

    /// Close the product list and append the filter script
    pub fn finish(mut self) -> String {
        self.html.push_str("\n    </div>\n</body>");
        self.html.push_str(filter_script());
        self.html.push_str("</html>\n");
        self.html
    }
}

pub fn write_page(out_dir: &Path, html: &str) -> Result<PathBuf> {
    let path = out_dir.join(INDEX_FILE);
    fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
