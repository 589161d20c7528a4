//! clove-vm — moteur d’exécution : pile de valeurs bornée, boucle de dispatch,
//! sémantique des opérateurs et rapport d’erreurs runtime avec numéro de ligne.
//!
//! ```
//! use clove_vm::{Vm, VmOptions};
//!
//! let (mut vm, out, _err) = Vm::with_captured_output(VmOptions::default());
//! vm.interpret("\"st\" + \"ring\"").unwrap();
//! assert_eq!(out.get(), "string\n");
//! ```
//!
//! Un `Vm` peut enchaîner les appels à `interpret` (REPL) : une erreur runtime
//! vide la pile mais laisse l’instance réutilisable. Les objets alloués restent
//! vivants jusqu’au drop du `Vm`. Un `Chunk` compilé ne dépend d’aucune VM et
//! peut être exécuté par plusieurs d’entre elles.

#![deny(missing_docs)]

use std::{
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
};

mod error;
mod vm;

pub use error::{InterpretError, RuntimeError, VmResult};
pub use vm::{Vm, VmOptions, STACK_MAX};

/* ─────────────────────── Outil de capture ─────────────────────── */

/// Shared in-memory writer; clones append to the same buffer.
#[derive(Debug, Default, Clone)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    /// Everything written so far, decoded as lossy UTF-8.
    pub fn get(&self) -> String { String::from_utf8_lossy(&self.bytes()).into_owned() }

    /// Raw bytes written so far.
    pub fn bytes(&self) -> Vec<u8> { self.0.lock().unwrap_or_else(PoisonError::into_inner).clone() }

    /// Forget everything written so far.
    pub fn clear(&self) { self.0.lock().unwrap_or_else(PoisonError::into_inner).clear(); }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}
