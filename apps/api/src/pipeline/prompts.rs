// Prompt builders for the extraction and estimation calls.
// Reuses the cross-cutting output contract from llm_client::prompts.

use crate::llm_client::prompts::JSON_ARRAY_ONLY;

/// Extraction prompt: the (already truncated) document in, `[{product, features}]` out.
pub fn extraction_prompt(document_text: &str) -> String {
    format!(
        r#"Analyze the following document and extract all products and their associated features.

Document content:
{document_text}

Please provide the output in a structured format as a table with exactly 2 columns:
1. Product
2. Features

Format the output as a JSON array of objects, where each object has exactly two string keys, "product" and "features".
Example format:
[
  {{"product": "Product Name 1", "features": "Feature 1, Feature 2, Feature 3"}},
  {{"product": "Product Name 2", "features": "Feature A, Feature B"}}
]

{JSON_ARRAY_ONLY}"#
    )
}

/// Estimation prompt: extracted items and the rendered reference table in,
/// `[{product, features, size, hours}]` out.
pub fn estimation_prompt(items_json: &str, reference_table: &str) -> String {
    format!(
        r#"You are an estimator. Based on the products and features extracted, and the scope configuration provided, estimate the size and development hours for each product-feature combination.

Products and Features extracted:
{items_json}

Scope Configuration (sample):
{reference_table}

Please provide the output as a JSON array of objects with exactly 4 keys:
1. "product" — copied unchanged from the extracted list
2. "features" — copied unchanged from the extracted list
3. "size" — estimated size based on the scope configuration: X-Small, Small, Medium, Large, or X-Large
4. "hours" — estimated development hours based on the scope configuration, as a number

Format:
[
  {{"product": "Product Name 1", "features": "Feature 1, Feature 2", "size": "Small", "hours": 8}},
  {{"product": "Product Name 2", "features": "Feature A, Feature B", "size": "Medium", "hours": 12}}
]

Important: Return exactly one object per extracted product and do not add products that are not in the extracted list.
Extract the hours from the scope configuration based on the size. If the scope configuration shows dev hours for different sizes, match the hours to the estimated size. Return numeric values for hours.

{JSON_ARRAY_ONLY}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_prompt_embeds_document_and_contract() {
        let prompt = extraction_prompt("Product: Login.");
        assert!(prompt.contains("Document content:\nProduct: Login.\n"));
        assert!(prompt.contains(r#""product" and "features""#));
        assert!(prompt.contains(JSON_ARRAY_ONLY));
    }

    #[test]
    fn test_document_braces_are_not_format_placeholders() {
        let prompt = extraction_prompt("config {json} {document_text}");
        assert!(prompt.contains("config {json} {document_text}"));
    }

    #[test]
    fn test_estimation_prompt_embeds_items_and_table() {
        let prompt = estimation_prompt("[ITEMS]", "[TABLE]");
        let items_at = prompt.find("[ITEMS]").unwrap();
        let table_at = prompt.find("[TABLE]").unwrap();
        assert!(items_at < table_at);
        assert!(prompt.contains("\"hours\""));
        assert!(prompt.contains("X-Small, Small, Medium, Large, or X-Large"));
    }
}
