//! Customer-added overlay
//!
//! The only view with a context-sensitive mode: when the user is already on
//! the customers screen the overlay is an inline confirmation that stays
//! until acted on.

use serde_json::json;

use super::{Navigation, NotificationView, OverlayMode, CUSTOMERS_PATH};
use crate::types::{Category, CustomerAddedData};

pub struct CustomerAddedView;

impl NotificationView for CustomerAddedView {
    type Data = CustomerAddedData;

    const CATEGORY: Category = Category::CustomerAdded;

    fn title(&self) -> &'static str {
        "New customer added"
    }

    fn message(&self, data: &CustomerAddedData) -> String {
        format!(
            "{} added a new customer: {}",
            data.added_by.display_name(),
            data.customer_name
        )
    }

    fn destination(&self, data: &CustomerAddedData) -> Navigation {
        Navigation::to(CUSTOMERS_PATH).with_state(json!({
            "selectCustomer": data.customer_id,
            "customerName": data.customer_name,
        }))
    }

    fn mode(&self, _data: &CustomerAddedData, current_path: &str) -> OverlayMode {
        if is_customers_screen(current_path) {
            OverlayMode::Inline
        } else {
            OverlayMode::Modal
        }
    }
}

/// `/customers`, `/customers/`, or `/customers?page=2`
fn is_customers_screen(path: &str) -> bool {
    let path = path.split(&['?', '#'][..]).next().unwrap_or(path);
    path.trim_end_matches('/') == CUSTOMERS_PATH
}
