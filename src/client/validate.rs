//! Parameter validation run before any byte is built (spec §4.8, §7
//! "Validation"). Always non-retryable - a bad parameter stays bad on
//! retry.

use crate::errors::ValidationError;
use crate::pdu::{read_write_registers, write_multiple};

fn quantity_in_range(quantity: u16, max: u16, what: &str) -> Result<(), ValidationError> {
    if quantity == 0 || quantity > max {
        return Err(ValidationError::new(format!(
            "{what} quantity {quantity} out of range 1..={max}"
        )));
    }
    Ok(())
}

pub fn bit_read_quantity(quantity: u16) -> Result<(), ValidationError> {
    quantity_in_range(quantity, 2000, "coil/discrete-input read")
}

pub fn register_read_quantity(quantity: u16) -> Result<(), ValidationError> {
    quantity_in_range(quantity, 125, "register read")
}

pub fn coil_write_quantity(quantity: u16) -> Result<(), ValidationError> {
    quantity_in_range(quantity, write_multiple::MAX_COIL_QUANTITY, "coil write")
}

pub fn register_write_quantity(quantity: u16) -> Result<(), ValidationError> {
    quantity_in_range(
        quantity,
        write_multiple::MAX_REGISTER_QUANTITY,
        "register write",
    )
}

pub fn read_write_quantities(read_quantity: u16, write_quantity: u16) -> Result<(), ValidationError> {
    quantity_in_range(
        read_quantity,
        read_write_registers::MAX_READ_QUANTITY,
        "read/write read",
    )?;
    quantity_in_range(
        write_quantity,
        read_write_registers::MAX_WRITE_QUANTITY,
        "read/write write",
    )
}

pub fn non_empty<T>(values: &[T], what: &str) -> Result<(), ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::new(format!("{what} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_quantity() {
        assert!(bit_read_quantity(0).is_err());
    }

    #[test]
    fn rejects_over_cap_quantity() {
        assert!(register_read_quantity(126).is_err());
        assert!(register_read_quantity(125).is_ok());
    }

    #[test]
    fn rejects_write_cap_over_121() {
        assert!(read_write_quantities(1, 122).is_err());
        assert!(read_write_quantities(1, 121).is_ok());
    }

    #[test]
    fn rejects_empty_value_array() {
        assert!(non_empty::<u16>(&[], "register values").is_err());
    }
}
