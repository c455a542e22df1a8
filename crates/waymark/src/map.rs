//! Driving the map renderer.
//!
//! Rendering lives behind [`MapSurface`]. [`MapController`] keeps one marker per
//! geocoded contact, moves the camera on selection, and feeds settled bounds to
//! the [`ViewportReconciler`].

use std::sync::Arc;

use ahash::AHashMap as HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use waymark_data::{Contact, ContactId, Coordinates, is_region};

use crate::error::Result;
use crate::events::UiEvent;
use crate::geocode::{GeocodeError, GeocodeResolver, GeocodedLocation, Scope};
use crate::selection::SelectionState;
use crate::viewport::{ListedContact, ViewportBounds, ViewportReconciler, ordered_contact_list};

pub const CONTACT_ZOOM: f64 = 14.0;
pub const PLACE_ZOOM: f64 = 10.0;
pub const REGION_ZOOM: f64 = 6.0;

/// Opaque marker id issued by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

/// Capabilities the renderer exposes.
pub trait MapSurface {
    fn set_camera(&mut self, center: Coordinates, zoom: f64) -> anyhow::Result<()>;

    fn place_marker(&mut self, position: Coordinates, content: &str) -> anyhow::Result<MarkerHandle>;

    fn remove_marker(&mut self, handle: MarkerHandle) -> anyhow::Result<()>;

    fn visible_bounds(&self) -> anyhow::Result<ViewportBounds>;
}

#[derive(Debug)]
pub struct MapController<M> {
    surface: M,
    resolver: Arc<GeocodeResolver>,
    reconciler: ViewportReconciler,
    selection: SelectionState,
    markers: HashMap<ContactId, (MarkerHandle, Coordinates)>,
    events: mpsc::UnboundedSender<UiEvent>,
}

impl<M: MapSurface> MapController<M> {
    pub fn new(
        surface: M,
        resolver: Arc<GeocodeResolver>,
        events: mpsc::UnboundedSender<UiEvent>,
    ) -> Self {
        Self {
            surface,
            resolver,
            reconciler: ViewportReconciler::new(),
            selection: SelectionState::default(),
            markers: HashMap::new(),
            events,
        }
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut M {
        &mut self.surface
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn visible_contacts(&self) -> &[Contact] {
        self.reconciler.visible_contacts()
    }

    /// Replace the contact collection and sync markers with it.
    #[instrument(name = "Set map contacts", skip_all, fields(count = contacts.len()))]
    pub fn set_contacts(&mut self, contacts: Vec<Contact>) -> Result<()> {
        let wanted: HashMap<&ContactId, (&Contact, Coordinates)> = contacts
            .iter()
            .filter_map(|c| c.coordinates().map(|p| (&c.id, (c, p))))
            .collect();

        let stale: Vec<ContactId> = self
            .markers
            .iter()
            .filter(|(id, (_, at))| wanted.get(id).is_none_or(|(_, p)| p != at))
            .map(|(id, _)| id.clone())
            .collect();
        for id in stale {
            if let Some((handle, _)) = self.markers.remove(&id) {
                self.surface.remove_marker(handle)?;
            }
        }

        for contact in &contacts {
            let Some(position) = contact.coordinates() else {
                continue;
            };
            if !self.markers.contains_key(&contact.id) {
                let handle = self.surface.place_marker(position, &contact.display_name())?;
                self.markers.insert(contact.id.clone(), (handle, position));
            }
        }
        debug!(markers = self.markers.len(), "Markers synced");

        self.resolver.index_contacts(&contacts);
        if self.reconciler.set_contacts(contacts) {
            self.emit_visible();
        }
        Ok(())
    }

    /// Highlight a contact and fly to it when it has coordinates.
    pub fn select_contact(&mut self, contact: &Contact) -> Result<()> {
        self.selection.select_contact(contact.id.clone());
        match contact.coordinates() {
            Some(position) => self.surface.set_camera(position, CONTACT_ZOOM)?,
            None => debug!(id = %contact.id, "Selected contact has no coordinates"),
        }
        Ok(())
    }

    /// Make `name` the active place and fly to it.
    ///
    /// Returns `Ok(None)` when the place cannot be found; the place still drives
    /// list ordering. Provider failures are returned as errors.
    pub async fn select_place(&mut self, name: &str) -> Result<Option<GeocodedLocation>> {
        self.selection.select_place(name);
        match self.resolver.resolve(name, Scope::Local).await {
            Ok(location) => {
                let zoom = if is_region(&location.name) || is_region(name) {
                    REGION_ZOOM
                } else {
                    PLACE_ZOOM
                };
                info!(place = %location.name, zoom, "Flying to place");
                self.surface.set_camera(location.coordinates, zoom)?;
                Ok(Some(location))
            }
            Err(GeocodeError::NotFound { .. }) => {
                debug!(place = name, "Selected place not found");
                Ok(None)
            }
            Err(e) => {
                warn!(place = name, error = %e, "Could not resolve selected place");
                Err(e.into())
            }
        }
    }

    /// Handle a "bounds settled" notification from the renderer.
    pub fn on_bounds_settled(&mut self) -> Result<bool> {
        let bounds = self.surface.visible_bounds()?;
        let changed = self.reconciler.on_bounds_changed(bounds);
        if changed {
            self.emit_visible();
        }
        Ok(changed)
    }

    /// The contact list in display order.
    pub fn ordered_contacts(&self) -> Vec<ListedContact<'_>> {
        ordered_contact_list(
            self.reconciler.contacts(),
            self.reconciler.visible_contacts(),
            self.selection.active_place(),
        )
    }

    fn emit_visible(&self) {
        let visible = self.reconciler.visible_contacts().to_vec();
        if self.events.send(UiEvent::VisibleContactsChanged(visible)).is_err() {
            debug!("UI event receiver dropped");
        }
    }
}
