//! clove-core — primitives partagées de la VM Clove
//!
//! Fournit :
//! - `Value` (nil / bool / number / handle d'objet) + prédicats et accesseurs
//! - `Heap` : propriétaire unique de ses objets (`ObjString`), libérés en bloc ;
//!   chaque handle connaît le tas qui l'a émis
//! - `Chunk` : octets d'instructions, `LineTable` en runs `(ligne, longueur)`, pool de constantes,
//!   chaînes constantes possédées par le chunk
//! - `OpCode` : jeu d'instructions et décodage faillible
//! - `disasm` : rendu textuel d'un chunk ; `asm` : assembleur texte minimal
//! - Erreurs `ChunkError` / `AsmError`

#![deny(missing_docs)]

/* ─────────────────────────── Modules publics ─────────────────────────── */

/// Primitives de bytecode (chunk, opcodes, assembleur, désassembleur).
pub mod bytecode;
/// Valeurs dynamiques et tas d'objets.
pub mod value;

/// Raccourci : ré-exporte le désassembleur textuel.
pub use bytecode::disasm;
/// Raccourci : ré-exporte l'assembleur minimal.
pub use bytecode::asm;

pub use bytecode::{AsmError, Chunk, ChunkError, LineTable, OpCode};
pub use value::{Heap, HeapId, Obj, ObjKind, ObjRef, ObjString, Value, ValueDisplay};
