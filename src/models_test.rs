use super::*;
use serde_json::json;

// =============================================================================
// Product decoding
// =============================================================================

#[test]
fn product_detail_decodes_api_shape() {
    let product: Product = serde_json::from_value(json!({
        "id": 7,
        "name": "Aceh Gayo",
        "slug": "aceh-gayo",
        "price": 95000,
        "description": "Single origin",
        "image_url": ["a.jpg", "b.jpg"],
        "stock_qty": 12,
        "isAvailable": true,
        "specifications": { "origin": "Aceh" },
        "grinding": { "french-press": "coarse" }
    }))
    .unwrap();

    assert_eq!(product.id, "7");
    assert_eq!(product.image_url, vec!["a.jpg", "b.jpg"]);
    assert_eq!(product.stock_qty, 12);
    assert!(product.is_available);
    assert_eq!(product.specifications["origin"], "Aceh");
}

#[test]
fn product_summary_accepts_single_image_url() {
    let summary: ProductSummary = serde_json::from_value(json!({
        "id": "p1", "name": "Toraja", "slug": "toraja", "price": 80000.0, "image_url": "t.jpg"
    }))
    .unwrap();
    assert_eq!(summary.image_url, vec!["t.jpg"]);
    assert_eq!(summary.description, "");
}

#[test]
fn product_page_decodes_pagination() {
    let page: ProductPage = serde_json::from_value(json!({
        "products": [],
        "pagination": { "currentPage": 2, "totalPages": 5, "total": 48 }
    }))
    .unwrap();
    assert_eq!(page.pagination, Some(Pagination { current_page: 2, total_pages: 5, total: 48 }));
}

// =============================================================================
// Cart / orders / user
// =============================================================================

#[test]
fn cart_item_request_serializes_camel_case() {
    let body = serde_json::to_value(CartItemRequest { product_id: "42".into(), quantity: 1 }).unwrap();
    assert_eq!(body, json!({ "productId": "42", "quantity": 1 }));
}

#[test]
fn cart_defaults_when_empty() {
    let cart: Cart = serde_json::from_value(json!({})).unwrap();
    assert!(cart.items.is_empty());
    assert!(cart.total_price.abs() < f64::EPSILON);
}

#[test]
fn order_accepts_snake_case_aliases() {
    let order: Order = serde_json::from_value(json!({
        "id": 3, "status": "paid", "total_price": 10.5,
        "items": [{ "product_id": 9, "quantity": 2, "price": 5.25 }]
    }))
    .unwrap();
    assert_eq!(order.id, "3");
    assert_eq!(order.items[0].product_id, "9");
}

#[test]
fn user_without_email_is_rejected() {
    let result = serde_json::from_value::<User>(json!({ "id": 1, "name": "Ana" }));
    assert!(result.is_err());
}

// =============================================================================
// parse_quantity
// =============================================================================

#[test]
fn parse_quantity_defaults_to_one() {
    assert_eq!(parse_quantity(None), 1);
    assert_eq!(parse_quantity(Some("")), 1);
    assert_eq!(parse_quantity(Some("abc")), 1);
    assert_eq!(parse_quantity(Some("0")), 1);
    assert_eq!(parse_quantity(Some("-3")), 1);
}

#[test]
fn parse_quantity_keeps_positive_values_unclamped() {
    assert_eq!(parse_quantity(Some("3")), 3);
    assert_eq!(parse_quantity(Some(" 500 ")), 500);
}

#[test]
fn parse_quantity_accepts_integral_decimals() {
    assert_eq!(parse_quantity(Some("2.0")), 2);
    assert_eq!(parse_quantity(Some("2.5")), 1);
    assert_eq!(parse_quantity(Some("-2.0")), 1);
    assert_eq!(parse_quantity(Some("NaN")), 1);
}

// =============================================================================
// QuantitySelector
// =============================================================================

#[test]
fn selector_starts_at_one_when_in_stock() {
    assert_eq!(QuantitySelector::new(5, true).quantity(), 1);
}

#[test]
fn selector_starts_at_zero_when_unavailable() {
    let sel = QuantitySelector::new(5, false);
    assert_eq!(sel.quantity(), 0);
    assert!(!sel.can_purchase());
    let empty = QuantitySelector::new(0, true);
    assert_eq!(empty.quantity(), 0);
}

#[test]
fn selector_increase_clamps_to_stock() {
    let mut sel = QuantitySelector::new(2, true);
    sel.increase();
    sel.increase();
    sel.increase();
    assert_eq!(sel.quantity(), 2);
}

#[test]
fn selector_decrease_floors_at_one() {
    let mut sel = QuantitySelector::new(3, true);
    sel.decrease();
    assert_eq!(sel.quantity(), 1);
}

#[test]
fn selector_set_ignores_out_of_range() {
    let mut sel = QuantitySelector::new(4, true);
    sel.set(3);
    assert_eq!(sel.quantity(), 3);
    sel.set(0);
    sel.set(9);
    assert_eq!(sel.quantity(), 3);
}
