use windows::{
    Win32::{
        System::Variant::VARIANT,
        UI::Accessibility::{AccessibleChildren, IAccessible},
    },
    core::{IDispatch, Interface},
};

use crate::accessibility::{Accessible, Location, Role, State};

const CHILDID_SELF: i32 = 0;

#[inline]
fn self_id() -> VARIANT {
    VARIANT::from(CHILDID_SELF)
}

/// Child objects returned by `AccessibleChildren`.
///
/// Objects arrive as `VT_DISPATCH`. Simple elements arrive as `VT_I4` child ids,
/// have no interface of their own and are skipped.
fn nodes(variants: &[VARIANT]) -> Vec<MsaaNode> {
    variants
        .iter()
        .filter_map(|variant| IDispatch::try_from(variant).ok())
        .filter_map(|dispatch| dispatch.cast::<IAccessible>().ok())
        .map(MsaaNode)
        .collect()
}

/// A live node of the host MSAA tree.
#[derive(Debug, Clone)]
pub struct MsaaNode(pub IAccessible);

impl Accessible for MsaaNode {
    fn child_count(&self) -> Option<usize> {
        let count = unsafe { self.0.accChildCount() }.ok()?;
        usize::try_from(count).ok()
    }

    fn children(&self, start: usize, count: usize) -> Option<Vec<Self>> {
        if count == 0 {
            return Some(Vec::new());
        }

        let mut variants: Vec<VARIANT> = (0..count).map(|_| VARIANT::default()).collect();
        let mut obtained = 0;
        unsafe {
            AccessibleChildren(
                &self.0,
                i32::try_from(start).ok()?,
                &mut variants,
                &mut obtained,
            )
        }
        .ok()?;

        let obtained = usize::try_from(obtained).unwrap_or(0).min(count);
        Some(nodes(&variants[..obtained]))
    }

    fn parent(&self) -> Option<Self> {
        let dispatch = unsafe { self.0.accParent() }.ok()?;
        dispatch.cast::<IAccessible>().ok().map(MsaaNode)
    }

    fn role(&self) -> Option<Role> {
        let role = unsafe { self.0.get_accRole(&self_id()) }.ok()?;
        let role = i32::try_from(&role).ok()?;
        Some(Role(role as u32))
    }

    fn state(&self) -> Option<State> {
        let state = unsafe { self.0.get_accState(&self_id()) }.ok()?;
        let state = i32::try_from(&state).ok()?;
        Some(State::from_bits_retain(state as u32))
    }

    fn name(&self) -> Option<String> {
        unsafe { self.0.get_accName(&self_id()) }
            .ok()
            .map(|name| name.to_string())
    }

    fn description(&self) -> Option<String> {
        unsafe { self.0.get_accDescription(&self_id()) }
            .ok()
            .map(|description| description.to_string())
    }

    fn value(&self) -> Option<String> {
        unsafe { self.0.get_accValue(&self_id()) }
            .ok()
            .map(|value| value.to_string())
    }

    fn location(&self) -> Option<Location> {
        let mut location = Location::default();
        unsafe {
            self.0.accLocation(
                &mut location.x,
                &mut location.y,
                &mut location.width,
                &mut location.height,
                &self_id(),
            )
        }
        .ok()?;

        Some(location)
    }
}
