mod set_entry;

use proc_macro::TokenStream;

/// Derive macro implementing `docset::SetEntry` from a struct field.
///
/// # Usage
///
/// ```ignore
/// use docset::SetEntry;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, SetEntry)]
/// struct Offer {
///     #[set_entry(id)]
///     pub offer_id: String,
///     pub price: u64,
/// }
/// ```
///
/// - `#[set_entry(id)]` marks the field whose `to_string()` is the member identifier.
///   If omitted, defaults to a field named `id`.
#[proc_macro_derive(SetEntry, attributes(set_entry))]
pub fn derive_set_entry(input: TokenStream) -> TokenStream {
    set_entry::derive_set_entry(input)
}
