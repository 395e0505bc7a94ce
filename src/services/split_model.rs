// src/services/split_model.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        fulfillment::{
            FieldRep, FulfillmentPlan, FulfillmentSource, FulfillmentSplit, PlanLine,
            PlanViolation, Supplier,
        },
        invoice::{Invoice, InvoiceLineItem},
    },
};

/// Converte os dados de atendimento de um item para a forma com divisões.
///
/// Sem divisões gravadas, sintetiza uma única divisão com a quantidade toda,
/// semeada com os campos de fonte única do formato antigo.
pub fn normalize_line(item: &InvoiceLineItem) -> PlanLine {
    let splits = if item.splits.is_empty() {
        let mut seeded = FulfillmentSplit::empty(&item.id);
        seeded.quantity = item.quantity;
        seeded.fulfillment_source = item.fulfillment_source;
        seeded.serial_numbers = item.serial_numbers.clone();
        seeded.field_rep = item.field_rep.clone();
        seeded.purchase_order_id = item.purchase_order_id.clone();
        seeded.supplier = item.supplier.clone();
        // O formato antigo às vezes trazia campos de outra fonte
        let source = seeded.fulfillment_source;
        seeded.switch_source(source);
        vec![seeded]
    } else {
        item.splits
            .iter()
            .cloned()
            .map(|mut s| {
                s.line_item_id = item.id.clone();
                s
            })
            .collect()
    };

    PlanLine {
        line_item_id: item.id.clone(),
        product_id: item.product_id.clone(),
        product_name: item.product_name.clone(),
        quantity: item.quantity,
        skip_fulfillment: item.skip_fulfillment,
        skip_reason: item.skip_reason.clone(),
        splits,
    }
}

/// Erros de campo de um item. Vazio quando o item pode ser enviado.
pub fn validate_line(line: &PlanLine) -> Vec<PlanViolation> {
    if line.skip_fulfillment {
        let has_reason = line
            .skip_reason
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty());
        return if has_reason {
            Vec::new()
        } else {
            vec![PlanViolation::SkipReasonMissing {
                line_item_id: line.line_item_id.clone(),
            }]
        };
    }

    if line.splits.is_empty() {
        return vec![PlanViolation::NoSplits {
            line_item_id: line.line_item_id.clone(),
        }];
    }

    let mut violations = Vec::new();

    let assigned = line.assigned_quantity();
    if assigned != u64::from(line.quantity) {
        violations.push(PlanViolation::QuantityMismatch {
            line_item_id: line.line_item_id.clone(),
            requested: line.quantity,
            assigned,
        });
    }

    for split in &line.splits {
        let missing = split.missing_fields();
        if !missing.is_empty() {
            violations.push(PlanViolation::SplitIncomplete {
                line_item_id: line.line_item_id.clone(),
                split_id: split.id,
                missing,
            });
        }
    }

    violations
}

impl FulfillmentPlan {
    pub fn from_invoice(invoice: &Invoice, opened_by: &str, opened_at: DateTime<Utc>) -> Self {
        Self {
            invoice_id: invoice.id.clone(),
            customer_name: invoice.customer_name.clone(),
            lines: invoice.line_items.iter().map(normalize_line).collect(),
            opened_by: opened_by.to_string(),
            opened_at,
        }
    }

    pub fn validate(&self) -> Vec<PlanViolation> {
        self.lines.iter().flat_map(validate_line).collect()
    }

    pub fn line(&self, line_item_id: &str) -> Result<&PlanLine, AppError> {
        self.lines
            .iter()
            .find(|l| l.line_item_id == line_item_id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Item {}", line_item_id)))
    }

    fn line_mut(&mut self, line_item_id: &str) -> Result<&mut PlanLine, AppError> {
        self.lines
            .iter_mut()
            .find(|l| l.line_item_id == line_item_id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Item {}", line_item_id)))
    }

    pub fn split(&self, split_id: Uuid) -> Result<&FulfillmentSplit, AppError> {
        self.lines
            .iter()
            .flat_map(|l| l.splits.iter())
            .find(|s| s.id == split_id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Divisão {}", split_id)))
    }

    fn split_mut(&mut self, split_id: Uuid) -> Result<&mut FulfillmentSplit, AppError> {
        self.lines
            .iter_mut()
            .flat_map(|l| l.splits.iter_mut())
            .find(|s| s.id == split_id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Divisão {}", split_id)))
    }

    // --- EDIÇÕES ---

    pub fn add_split(&mut self, line_item_id: &str) -> Result<Uuid, AppError> {
        let line = self.line_mut(line_item_id)?;
        let split = FulfillmentSplit::empty(line_item_id);
        let id = split.id;
        line.splits.push(split);
        Ok(id)
    }

    pub fn remove_split(&mut self, split_id: Uuid) -> Result<(), AppError> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.splits.iter().any(|s| s.id == split_id))
            .ok_or_else(|| AppError::ResourceNotFound(format!("Divisão {}", split_id)))?;

        if !line.skip_fulfillment && line.splits.len() == 1 {
            return Err(AppError::InvalidEdit(format!(
                "o item {} precisa de pelo menos uma divisão",
                line.line_item_id
            )));
        }

        line.splits.retain(|s| s.id != split_id);
        Ok(())
    }

    pub fn set_split_quantity(&mut self, split_id: Uuid, quantity: u32) -> Result<(), AppError> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.splits.iter().any(|s| s.id == split_id))
            .ok_or_else(|| AppError::ResourceNotFound(format!("Divisão {}", split_id)))?;

        if quantity == 0 || quantity > line.quantity {
            return Err(AppError::InvalidEdit(format!(
                "a quantidade da divisão deve ficar entre 1 e {} (item {})",
                line.quantity, line.line_item_id
            )));
        }

        if let Some(split) = line.splits.iter_mut().find(|s| s.id == split_id) {
            split.quantity = quantity;
        }
        Ok(())
    }

    pub fn set_split_source(
        &mut self,
        split_id: Uuid,
        source: Option<FulfillmentSource>,
    ) -> Result<(), AppError> {
        self.split_mut(split_id)?.switch_source(source);
        Ok(())
    }

    pub fn set_serial_numbers(&mut self, split_id: Uuid, serials: Vec<String>) -> Result<(), AppError> {
        let split = self.split_mut(split_id)?;
        if !split.fulfillment_source.is_some_and(FulfillmentSource::uses_serials) {
            return Err(AppError::InvalidEdit(
                "números de série só valem para armazém, filial ou representante".into(),
            ));
        }

        let mut cleaned: Vec<String> = Vec::with_capacity(serials.len());
        for serial in serials {
            let serial = serial.trim().to_string();
            if serial.is_empty() {
                continue;
            }
            if cleaned.contains(&serial) {
                return Err(AppError::InvalidEdit(format!("número de série repetido: {}", serial)));
            }
            cleaned.push(serial);
        }

        split.serial_numbers = cleaned;
        Ok(())
    }

    pub fn assign_field_rep(&mut self, split_id: Uuid, rep: FieldRep) -> Result<(), AppError> {
        let split = self.split_mut(split_id)?;
        if split.fulfillment_source != Some(FulfillmentSource::FieldRep) {
            return Err(AppError::InvalidEdit(
                "representante só pode ser atribuído a divisões FIELD_REP".into(),
            ));
        }
        split.field_rep = Some(rep);
        Ok(())
    }

    pub fn bind_purchase_order(
        &mut self,
        split_id: Uuid,
        purchase_order_id: &str,
        supplier: Option<Supplier>,
    ) -> Result<(), AppError> {
        let split = self.split_mut(split_id)?;
        if split.fulfillment_source != Some(FulfillmentSource::Outsource) {
            return Err(AppError::InvalidEdit(
                "ordem de compra só pode ser vinculada a divisões OUTSOURCE".into(),
            ));
        }
        if purchase_order_id.trim().is_empty() {
            return Err(AppError::InvalidEdit("referência da ordem de compra vazia".into()));
        }
        split.purchase_order_id = Some(purchase_order_id.trim().to_string());
        if supplier.is_some() {
            split.supplier = supplier;
        }
        Ok(())
    }

    pub fn set_skip(
        &mut self,
        line_item_id: &str,
        skip: bool,
        reason: Option<String>,
    ) -> Result<(), AppError> {
        let line = self.line_mut(line_item_id)?;
        line.skip_fulfillment = skip;
        line.skip_reason = if skip { reason } else { None };

        // Voltar a atender exige ao menos uma divisão
        if !skip && line.splits.is_empty() {
            let mut split = FulfillmentSplit::empty(line_item_id);
            split.quantity = line.quantity;
            line.splits.push(split);
        }
        Ok(())
    }
}
