//! Memory segment addressing.

use crate::asm::{Address, AsmBuilder, Comp, Dest};
use crate::ast::{Segment, Segment::*};
use crate::error::SegmentError;

use super::EmitContext;

pub const TEMP_BASE: u16 = 5;
pub const TEMP_SIZE: u16 = 8;
pub const POINTER_BASE: u16 = 3;
pub const POINTER_SIZE: u16 = 2;

/// Where a popped value should be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteTarget {
    /// A fixed symbol or RAM address.
    Direct(Address),
    /// The address has been computed into D.
    Computed,
}

/// Register holding the segment's base pointer, for the four indirect segments.
fn base_register(segment: Segment) -> Option<&'static str> {
    match segment {
        Local => Some("LCL"),
        Argument => Some("ARG"),
        This => Some("THIS"),
        That => Some("THAT"),
        Constant | Static | Pointer | Temp => None,
    }
}

fn fixed(segment: Segment, base: u16, size: u16, index: u16) -> Result<Address, SegmentError> {
    if index >= size {
        return Err(SegmentError::IndexOutOfRange { segment, index });
    }
    Ok(Address::Number(base + index))
}

/// Address of a directly addressed segment slot, `None` for the others.
fn direct_address(
    ctx: &EmitContext,
    segment: Segment,
    index: u16,
) -> Result<Option<Address>, SegmentError> {
    let addr = match segment {
        Temp => fixed(segment, TEMP_BASE, TEMP_SIZE, index)?,
        Pointer => fixed(segment, POINTER_BASE, POINTER_SIZE, index)?,
        Static => Address::Symbol(ctx.static_symbol(index)),
        Constant | Local | Argument | This | That => return Ok(None),
    };
    Ok(Some(addr))
}

/// Emit code leaving the value of `segment[index]` in D.
pub fn read(
    out: &mut AsmBuilder,
    ctx: &EmitContext,
    segment: Segment,
    index: u16,
) -> Result<(), SegmentError> {
    if segment == Constant {
        out.at(index).set(Dest::D, Comp::A);
        return Ok(());
    }

    if let Some(base) = base_register(segment) {
        out.at(base)
            .set(Dest::D, Comp::M)
            .at(index)
            .set(Dest::A, Comp::DPlusA) // A = base + index
            .set(Dest::D, Comp::M);
        return Ok(());
    }

    if let Some(addr) = direct_address(ctx, segment, index)? {
        out.at(addr).set(Dest::D, Comp::M);
    }
    Ok(())
}

/// Emit whatever is needed to locate `segment[index]` for writing.
pub fn write_target(
    out: &mut AsmBuilder,
    ctx: &EmitContext,
    segment: Segment,
    index: u16,
) -> Result<WriteTarget, SegmentError> {
    if segment == Constant {
        return Err(SegmentError::InvalidSegmentWrite(segment));
    }

    if let Some(base) = base_register(segment) {
        out.at(base)
            .set(Dest::D, Comp::M)
            .at(index)
            .set(Dest::D, Comp::DPlusA); // D = base + index
        return Ok(WriteTarget::Computed);
    }

    match direct_address(ctx, segment, index)? {
        Some(addr) => Ok(WriteTarget::Direct(addr)),
        None => Err(SegmentError::InvalidSegmentWrite(segment)),
    }
}
