//! C-callable boundary.
//!
//! The translation unit crosses this boundary as an opaque handle; the
//! linked program crosses as a word array with an explicit length. Every
//! failure is reported through the `err` out-parameter:
//!
//! - `-1`: statement syntax error
//! - `-2`: label syntax error
//! - `-3`: unexpected token
//! - `-4`: label not resolved (or out of range)
//! - `-5`: cannot set location
//!
//! `err` is untouched on success. Null or otherwise invalid pointers are the
//! caller's fault and may crash.
//!
//! ```cpp
//! int32_t err = 0;
//! uintptr_t len;
//! const TranslationUnit *unit = parse_asm("AND R0, R0, #0\nADD R0, R0, xa", &err);
//! if (err != 0) return err;
//! const uint16_t *words = link_asm(unit, &err, &len);
//! if (err != 0) return err;
//! // ...
//! free_words(words, len);
//! free_unit(unit);
//! ```

use crate::linker;
use crate::unit::TranslationUnit;
use libc::c_char;
use std::ffi::CStr;

unsafe fn text<'a>(assembly: *const c_char) -> &'a str {
    debug_assert!(!assembly.is_null());
    CStr::from_ptr(assembly)
        .to_str()
        .expect("assembly text must be valid UTF-8")
}

/// Parse assembly text into a fresh translation unit.
///
/// Returns an owned handle, or null with `*err` set. The handle is released
/// by [`free_unit`], or consumed by [`parse_asm_extend`].
#[allow(clippy::not_unsafe_ptr_arg_deref)]
#[no_mangle]
pub extern "C" fn parse_asm(assembly: *const c_char, err: *mut i32) -> *const TranslationUnit {
    let assembly = unsafe { text(assembly) };
    match TranslationUnit::parse(assembly) {
        Ok(unit) => Box::into_raw(Box::new(unit)),
        Err(error) => {
            unsafe { *err = error.code() };
            std::ptr::null()
        }
    }
}

/// Parse more assembly text, continuing `previous`'s location counter and
/// label scope.
///
/// Consumes `previous` whether or not the parse succeeds; the old handle
/// must not be passed to any function again. Returns the superseding unit,
/// or null with `*err` set.
#[allow(clippy::not_unsafe_ptr_arg_deref)]
#[no_mangle]
pub extern "C" fn parse_asm_extend(
    assembly: *const c_char,
    previous: *const TranslationUnit,
    err: *mut i32,
) -> *const TranslationUnit {
    let assembly = unsafe { text(assembly) };
    let previous = unsafe {
        debug_assert!(!previous.is_null());
        *Box::from_raw(previous as *mut TranslationUnit)
    };
    match TranslationUnit::parse_extend(assembly, previous) {
        Ok(unit) => Box::into_raw(Box::new(unit)),
        Err(error) => {
            unsafe { *err = error.code() };
            std::ptr::null()
        }
    }
}

/// Link a translation unit into its final word sequence.
///
/// The unit is only borrowed: it stays valid for further extension or
/// linking and must still be released with [`free_unit`]. On success `*len`
/// holds the word count and the returned array is released with
/// [`free_words`]; on failure returns null with `*err` set.
#[allow(clippy::not_unsafe_ptr_arg_deref)]
#[no_mangle]
pub extern "C" fn link_asm(
    unit: *const TranslationUnit,
    err: *mut i32,
    len: *mut usize,
) -> *const u16 {
    let unit = unsafe {
        debug_assert!(!unit.is_null());
        &*unit
    };
    match linker::link(unit) {
        Ok(words) => {
            unsafe {
                *err = 0;
                *len = words.len();
            }
            Box::into_raw(words.into_boxed_slice()) as *const u16
        }
        Err(error) => {
            unsafe { *err = error.code() };
            std::ptr::null()
        }
    }
}

/// Release a translation unit that will not be extended or linked again.
#[allow(clippy::not_unsafe_ptr_arg_deref)]
#[no_mangle]
pub extern "C" fn free_unit(unit: *const TranslationUnit) {
    if unit.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(unit as *mut TranslationUnit) });
}

/// Release a word array returned by [`link_asm`].
#[allow(clippy::not_unsafe_ptr_arg_deref)]
#[no_mangle]
pub extern "C" fn free_words(words: *const u16, len: usize) {
    if words.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(std::slice::from_raw_parts_mut(words as *mut u16, len)) });
}
