//! Named bulk panel layouts.
//!
//! A template is a fixed, ordered list of slots. Applying one replaces every
//! panel on the page: existing panels are deleted first, then one panel is
//! created per slot in slot order. [`plan_template`] computes that plan; the
//! editor executes it against the backing store.

use gutter_core::PercentRect;

use crate::model::{Panel, PanelDraft, PanelId};

/// One rectangle of a template, with optional skew in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateSlot {
    pub rect: PercentRect,
    pub skew_x: f64,
    pub skew_y: f64,
}

impl TemplateSlot {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            rect: PercentRect::new(x, y, width, height),
            skew_x: 0.0,
            skew_y: 0.0,
        }
    }

    #[must_use]
    pub const fn skewed(mut self, skew_x: f64, skew_y: f64) -> Self {
        self.skew_x = skew_x;
        self.skew_y = skew_y;
        self
    }

    /// Normalized draft for this slot.
    #[must_use]
    pub fn draft(&self) -> PanelDraft {
        PanelDraft::new(self.rect)
            .with_skew(self.skew_x, self.skew_y)
            .normalized()
    }
}

/// A named layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelTemplate {
    pub name: &'static str,
    pub slots: &'static [TemplateSlot],
}

impl PanelTemplate {
    /// Drafts for every slot, in slot order.
    #[must_use]
    pub fn drafts(&self) -> Vec<PanelDraft> {
        self.slots.iter().map(TemplateSlot::draft).collect()
    }
}

/// Built-in templates.
pub static TEMPLATES: &[PanelTemplate] = &[
    PanelTemplate {
        name: "Full Page",
        slots: &[TemplateSlot::new(2.0, 2.0, 96.0, 96.0)],
    },
    PanelTemplate {
        name: "2 Horizontal",
        slots: &[
            TemplateSlot::new(2.0, 2.0, 96.0, 47.0),
            TemplateSlot::new(2.0, 51.0, 96.0, 47.0),
        ],
    },
    PanelTemplate {
        name: "2 Vertical",
        slots: &[
            TemplateSlot::new(2.0, 2.0, 47.0, 96.0),
            TemplateSlot::new(51.0, 2.0, 47.0, 96.0),
        ],
    },
    PanelTemplate {
        name: "3 Horizontal",
        slots: &[
            TemplateSlot::new(2.0, 2.0, 96.0, 30.0),
            TemplateSlot::new(2.0, 35.0, 96.0, 30.0),
            TemplateSlot::new(2.0, 68.0, 96.0, 30.0),
        ],
    },
    PanelTemplate {
        name: "4 Grid",
        slots: &[
            TemplateSlot::new(2.0, 2.0, 47.0, 47.0),
            TemplateSlot::new(51.0, 2.0, 47.0, 47.0),
            TemplateSlot::new(2.0, 51.0, 47.0, 47.0),
            TemplateSlot::new(51.0, 51.0, 47.0, 47.0),
        ],
    },
    PanelTemplate {
        name: "6 Grid",
        slots: &[
            TemplateSlot::new(2.0, 2.0, 30.0, 47.0),
            TemplateSlot::new(35.0, 2.0, 30.0, 47.0),
            TemplateSlot::new(68.0, 2.0, 30.0, 47.0),
            TemplateSlot::new(2.0, 51.0, 30.0, 47.0),
            TemplateSlot::new(35.0, 51.0, 30.0, 47.0),
            TemplateSlot::new(68.0, 51.0, 30.0, 47.0),
        ],
    },
    PanelTemplate {
        name: "3 Diagonal",
        slots: &[
            TemplateSlot::new(2.0, 2.0, 96.0, 30.0).skewed(-5.0, 0.0),
            TemplateSlot::new(2.0, 35.0, 96.0, 30.0).skewed(5.0, 0.0),
            TemplateSlot::new(2.0, 68.0, 96.0, 30.0).skewed(-5.0, 0.0),
        ],
    },
    PanelTemplate {
        name: "L-Shape",
        slots: &[
            TemplateSlot::new(2.0, 2.0, 62.0, 62.0),
            TemplateSlot::new(66.0, 2.0, 32.0, 62.0),
            TemplateSlot::new(2.0, 66.0, 96.0, 32.0),
        ],
    },
    PanelTemplate {
        name: "Splash Page",
        slots: &[
            TemplateSlot::new(2.0, 2.0, 96.0, 70.0),
            TemplateSlot::new(2.0, 74.0, 30.0, 24.0),
            TemplateSlot::new(35.0, 74.0, 30.0, 24.0),
            TemplateSlot::new(68.0, 74.0, 30.0, 24.0),
        ],
    },
];

/// Look up a built-in template by name, ignoring ASCII case and surrounding
/// whitespace.
#[must_use]
pub fn template(name: &str) -> Option<&'static PanelTemplate> {
    let name = name.trim();
    TEMPLATES.iter().find(|t| t.name.eq_ignore_ascii_case(name))
}

/// Deletions and creations needed to apply a template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplatePlan {
    /// Existing panels to delete, in page order.
    pub delete: Vec<PanelId>,
    /// Panels to create, in template order.
    pub create: Vec<PanelDraft>,
}

impl TemplatePlan {
    /// Replacing existing panels is destructive and needs confirmation.
    #[must_use]
    pub fn needs_confirmation(&self) -> bool {
        !self.delete.is_empty()
    }
}

/// Plan the application of `template` over `existing` panels.
#[must_use]
pub fn plan_template(template: &PanelTemplate, existing: &[Panel]) -> TemplatePlan {
    let mut ordered: Vec<&Panel> = existing.iter().collect();
    ordered.sort_by_key(|panel| (panel.order, panel.id));
    TemplatePlan {
        delete: ordered.into_iter().map(|panel| panel.id).collect(),
        create: template.drafts(),
    }
}
