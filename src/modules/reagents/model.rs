use serde::{Deserialize, Serialize};
use validator::Validate;

use chemstore_core::{FieldLabels, Sanitizer};
use chemstore_db::instances::ReagentInstance;
use chemstore_db::reagents::Reagent;
use chemstore_db::users::StorageUser;

use crate::validator::FormInput;

/// Body of both creating and editing a reagent.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ReagentRequest {
    #[validate(length(min = 1, max = 300))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub formula: String,
}

impl FieldLabels for ReagentRequest {
    fn field_label(field: &str) -> Option<&'static str> {
        Reagent::field_label(field)
    }
}

impl FormInput for ReagentRequest {
    fn sanitize(&mut self, sanitizer: &Sanitizer) {
        self.name = sanitizer.sanitize(&self.name);
        self.formula = sanitizer.sanitize(&self.formula);
    }
}

#[derive(Debug, Serialize)]
pub struct ReagentsPage {
    pub reagents: Vec<Reagent>,
    pub caller: StorageUser,
    pub next_offset: Option<i64>,
}

/// A reagent with its instances split into those still in stock and those
/// used up, plus the anti-forgery token for editing it.
#[derive(Debug, Serialize)]
pub struct ReagentView {
    pub reagent: Reagent,
    pub instances: Vec<ReagentInstance>,
    pub used_instances: Vec<ReagentInstance>,
    pub caller: StorageUser,
    pub put_xsrf: String,
}

#[derive(Debug, Serialize)]
pub struct NewReagentForm {
    pub post_xsrf: String,
}
