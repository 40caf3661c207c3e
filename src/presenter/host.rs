//! Presenter host: overlays, user actions and timer ownership

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::{destination, render, Action, Navigation, Navigator, Overlay};
use super::timer::DismissTimers;
use crate::store::{NotificationStore, StoreEvent};
use crate::types::Category;

pub struct PresenterHost {
    store: NotificationStore,
    navigator: Arc<dyn Navigator>,
    timers: DismissTimers,
    dismiss_after: Duration,
    /// Epoch and path the user was on when each visible notification arrived
    shown_on: HashMap<Category, (u64, String)>,
}

impl PresenterHost {
    pub fn new(store: NotificationStore, navigator: Arc<dyn Navigator>, dismiss_after: Duration) -> Self {
        Self {
            timers: DismissTimers::new(store.clone(), dismiss_after),
            store,
            navigator,
            dismiss_after,
            shown_on: HashMap::new(),
        }
    }

    pub fn timers(&self) -> &DismissTimers {
        &self.timers
    }

    /// React to a store change: arm, re-arm or cancel the category's timer
    pub fn on_store_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Shown { category, epoch } => {
                // A repeated or older report keeps the timer of what is on screen
                if matches!(self.shown_on.get(&category), Some((seen, _)) if *seen >= epoch) {
                    return;
                }
                let path = self.navigator.current_path();
                self.shown_on.insert(category, (epoch, path));

                match self.overlay(category) {
                    Some(overlay) => {
                        info!(category = %category, overlay = %overlay, "Showing notification");
                        if overlay.auto_dismiss.is_some() {
                            self.timers.arm(category, epoch);
                        } else {
                            self.timers.cancel(category);
                        }
                    }
                    // Hidden again before we got to it
                    None => {
                        self.timers.cancel(category);
                    }
                }
            }
            StoreEvent::Hidden { category } => {
                self.timers.cancel(category);
                self.shown_on.remove(&category);
            }
        }
    }

    /// Overlay for a category, or `None` when nothing is pending
    pub fn overlay(&self, category: Category) -> Option<Overlay> {
        let notification = self.store.get(category)?;
        let path = match self.shown_on.get(&category) {
            Some((_, path)) => path.clone(),
            None => self.navigator.current_path(),
        };
        Some(render(&notification, &path, self.dismiss_after))
    }

    /// All visible overlays in category order
    pub fn overlays(&self) -> Vec<Overlay> {
        Category::ALL
            .iter()
            .filter_map(|category| self.overlay(*category))
            .collect()
    }

    /// Close the overlay without navigating
    pub fn dismiss(&mut self, category: Category) -> bool {
        self.timers.cancel(category);
        self.shown_on.remove(&category);
        let hidden = self.store.hide(category);
        if hidden {
            debug!(category = %category, "Notification dismissed");
        }
        hidden
    }

    /// Close the overlay and go to the category's screen
    pub fn view(&mut self, category: Category) -> Option<Navigation> {
        let notification = self.store.get(category)?;
        self.timers.cancel(category);
        self.shown_on.remove(&category);
        self.store.hide(category);

        let navigation = destination(&notification);
        self.navigator.navigate(navigation.clone());
        Some(navigation)
    }

    pub fn act(&mut self, category: Category, action: Action) {
        match action {
            Action::Dismiss => {
                self.dismiss(category);
            }
            Action::View => {
                self.view(category);
            }
        }
    }

    /// Drop every pending timer (logout, shutdown)
    pub fn reset(&mut self) {
        self.timers.cancel_all();
        self.shown_on.clear();
        for category in Category::ALL {
            self.store.hide(category);
        }
    }
}
