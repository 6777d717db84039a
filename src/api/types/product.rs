//! Product request/response types

use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductChanges, ProductDraft, Specifications};
use crate::infrastructure::services::Page;

/// Body of `POST /products`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub reference_number: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub specifications: Specifications,
}

impl From<CreateProductRequest> for ProductDraft {
    fn from(request: CreateProductRequest) -> Self {
        Self {
            name: request.name,
            reference_number: request.reference_number,
            category: request.category,
            description: request.description,
            sku: request.sku,
            brand: request.brand,
            stock: request.stock,
            images: request.images,
            specifications: request.specifications,
        }
    }
}

/// Body of `PUT /products/{id}`; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub brand: Option<String>,
    pub stock: Option<i64>,
    pub images: Option<Vec<String>>,
    pub specifications: Option<Specifications>,
}

impl From<UpdateProductRequest> for ProductChanges {
    fn from(request: UpdateProductRequest) -> Self {
        Self {
            name: request.name,
            category: request.category,
            description: request.description,
            sku: request.sku,
            brand: request.brand,
            stock: request.stock,
            images: request.images,
            specifications: request.specifications,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub reference_number: String,
    pub category: String,
    pub description: String,
    pub sku: String,
    pub brand: String,
    pub stock: i64,
    pub images: Vec<String>,
    pub specifications: Specifications,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_str().to_string(),
            name: product.name.clone(),
            reference_number: product.reference_number.clone(),
            category: product.category.clone(),
            description: product.description.clone(),
            sku: product.sku.clone(),
            brand: product.brand.clone(),
            stock: product.stock,
            images: product.images.clone(),
            specifications: product.specifications.clone(),
            version: product.version,
            created_at: product.created_at.to_rfc3339(),
            updated_at: product.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListProductsResponse {
    pub products: Vec<ProductResponse>,
    pub limit: usize,
    pub offset: usize,
    pub count: usize,
}

impl ListProductsResponse {
    pub fn new(products: &[Product], page: Page) -> Self {
        let products: Vec<ProductResponse> = products.iter().map(ProductResponse::from).collect();

        Self {
            count: products.len(),
            products,
            limit: page.limit,
            offset: page.offset,
        }
    }
}

/// `limit` and `offset` query parameters.
///
/// Kept as raw strings so unparseable values fall back to defaults instead
/// of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PageParams {
    pub fn page(&self) -> Page {
        Page::new(parse_int(self.limit.as_deref()), parse_int(self.offset.as_deref()))
    }
}

/// Search query parameters: `q` plus pagination
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

impl SearchParams {
    /// The trimmed search term, if non-empty
    pub fn query(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

fn parse_int(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::services::DEFAULT_PAGE_LIMIT;

    fn params(limit: Option<&str>, offset: Option<&str>) -> PageParams {
        PageParams {
            limit: limit.map(String::from),
            offset: offset.map(String::from),
        }
    }

    #[test]
    fn test_page_params_parsing() {
        assert_eq!(params(Some("20"), Some("40")).page(), Page::new(Some(20), Some(40)));
        assert_eq!(params(None, None).page(), Page::default());

        let page = params(Some("abc"), Some("-3")).page();
        assert_eq!(page.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(page.offset, 0);

        assert_eq!(params(Some("101"), None).page().limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(params(Some("0"), None).page().limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn test_search_query_requires_content() {
        let mut search = SearchParams::default();
        assert_eq!(search.query(), None);

        search.q = Some("   ".to_string());
        assert_eq!(search.query(), None);

        search.q = Some(" lamp ".to_string());
        assert_eq!(search.query(), Some("lamp"));
    }

    #[test]
    fn test_create_request_camel_case() {
        let request: CreateProductRequest = serde_json::from_str(
            r#"{
                "name": "Desk Lamp",
                "referenceNumber": "L-1",
                "category": "Lighting",
                "stock": 4,
                "specifications": {"watts": 40, "dimmable": true}
            }"#,
        )
        .unwrap();

        let draft = ProductDraft::from(request);
        assert_eq!(draft.reference_number, "L-1");
        assert_eq!(draft.stock, 4);
        assert_eq!(draft.specifications.len(), 2);
        assert!(draft.images.is_empty());
    }

    #[test]
    fn test_product_response_serialization() {
        let product = Product::new(ProductDraft {
            name: "Desk Lamp".to_string(),
            reference_number: "L-1".to_string(),
            category: "Lighting".to_string(),
            ..Default::default()
        })
        .unwrap();

        let json = serde_json::to_value(ProductResponse::from(&product)).unwrap();
        assert_eq!(json["referenceNumber"], "L-1");
        assert_eq!(json["version"], 1);
        assert!(json["createdAt"].is_string());
    }
}
