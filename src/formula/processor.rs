use anyhow::Result;
use tracing::debug;

use super::fix_formula;
use crate::context::RunContext;
use crate::document::{Document, FORMULA_PROPERTY, ObjectKind, PropertyValue};
use crate::progress::ProgressInformer;

/// Run `fix_formula` over every formula object of the document, in order
///
/// A formula whose notation cannot be read aborts the run.
pub fn fix_document_formulas(
    document: &mut Document,
    context: &mut RunContext,
    progress: &mut dyn ProgressInformer,
) -> Result<usize> {
    let mut formulas = document.embedded_objects_mut(ObjectKind::Formula);
    let total = formulas.len();
    let mut changed = 0;

    for (index, object) in formulas.iter_mut().enumerate() {
        progress.inform(Some(index + 1), Some(total));

        let original = object.get_text_property(FORMULA_PROPERTY)?;
        let fixed = fix_formula(original);
        if fixed != original {
            debug!(object = %object.name, "rewrote formula");
            changed += 1;
        }
        object.set_property(FORMULA_PROPERTY, PropertyValue::Text(fixed));
        context.register_formula(&object.name);
    }

    Ok(changed)
}
