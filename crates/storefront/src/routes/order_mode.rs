//! Order-mode menu endpoints.
//!
//! Read-only JSON listings for the ordering frontend. Responses may be cached
//! by browsers and proxies for five minutes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cravely_core::ProductId;

use crate::error::{AppError, Result};
use crate::services::menu::{
    CategoryListing, CategoryRef, CategorySummary, DEFAULT_SEARCH_LIMIT, ProductView,
};
use crate::state::AppState;

/// `Cache-Control` value for listing responses.
pub const LISTING_CACHE_CONTROL: &str = "public, max-age=300";

fn cacheable<T: Serialize>(body: T) -> Response {
    ([(header::CACHE_CONTROL, LISTING_CACHE_CONTROL)], Json(body)).into_response()
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub success: bool,
    pub products: Vec<ProductView>,
    pub categories: Vec<CategorySummary>,
    pub total_products: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryProductsResponse {
    pub success: bool,
    pub category: CategoryRef,
    pub products: Vec<ProductView>,
    pub total_products: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub search_query: String,
    pub category_filter: String,
    pub products: Vec<ProductView>,
    pub total_results: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SingleProductResponse {
    pub success: bool,
    pub product: ProductView,
}

/// Query parameters for product search.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: String,
    pub limit: Option<usize>,
}

/// Categories that have at least one visible product.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Response> {
    let categories = state.menu().categories_with_products().await?;
    Ok(cacheable(CategoriesResponse {
        success: true,
        categories,
    }))
}

/// All visible products with category counts.
#[instrument(skip(state))]
pub async fn all_products(State(state): State<AppState>) -> Result<Response> {
    let listing = state.menu().all_products().await?;
    let total = listing.products.len();
    Ok(cacheable(ProductsResponse {
        success: true,
        products: listing.products,
        categories: listing.categories,
        total_products: total,
        message: format!("Successfully loaded {total} products"),
    }))
}

/// Visible products of one category, looked up by slug.
#[instrument(skip(state))]
pub async fn products_by_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response> {
    let found = state
        .menu()
        .products_in_category(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category \"{slug}\" not found")))?;

    let total = found.products.len();
    let message = format!(
        "Successfully loaded {total} products from {}",
        found.category.name
    );
    Ok(cacheable(CategoryProductsResponse {
        success: true,
        category: found.category,
        products: found.products,
        total_products: total,
        message,
    }))
}

/// Search visible products.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response> {
    let query = params.q.trim();
    let category = params.category.trim();
    let products = state
        .menu()
        .search(
            Some(query).filter(|q| !q.is_empty()),
            Some(category).filter(|c| !c.is_empty()),
            params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
        )
        .await?;

    let total = products.len();
    Ok(cacheable(SearchResponse {
        success: true,
        search_query: query.to_owned(),
        category_filter: category.to_owned(),
        products,
        total_results: total,
        message: format!("Found {total} products"),
    }))
}

/// One visible product. Accepts `42` or `product-42`.
#[instrument(skip(state))]
pub async fn single_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let not_found = || AppError::NotFound(format!("Product with ID {id} not found"));
    let product_id = ProductId::from_reference(&id).ok_or_else(not_found)?;
    let product = state
        .menu()
        .single_product(product_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(cacheable(SingleProductResponse {
        success: true,
        product,
    }))
}

/// Every category with its slug and sequence, for AJAX navigation.
#[instrument(skip(state))]
pub async fn category_list(State(state): State<AppState>) -> Result<Json<Vec<CategoryListing>>> {
    Ok(Json(state.menu().all_categories().await?))
}
