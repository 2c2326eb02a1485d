// src/analysis/naming.rs

/// Replace every whitespace character of a selection with `spaces`.
///
/// Each workflow's engine script picks its own replacement: `"name CA"`
/// becomes `"name_CA"` with `"_"` and `"nameCA"` with `""`.
pub fn clean_selection(selection: &str, spaces: &str) -> String {
    let mut cleaned = String::with_capacity(selection.len());
    for c in selection.chars() {
        if c.is_whitespace() {
            cleaned.push_str(spaces);
        } else {
            cleaned.push(c);
        }
    }
    cleaned
}

/// Build an output file name.
///
/// `prefix`, then each cleaned selection preceded by `_`, then `suffix`, then
/// `.ext` (omitted when `ext` is empty):
///
/// - `("RMSD", ["name CA"], "_", "", "dat")` → `RMSD_name_CA.dat`
/// - `("contacts", ["A B", "C"], "", "", "dat")` → `contacts_AB_C.dat`
/// - `("rdf", ["A", "B"], "_", "_g", "png")` → `rdf_A_B_g.png`
/// - `("RMSF_protein", [], "_", "", "pdb")` → `RMSF_protein.pdb`
pub fn output_file_name(
    prefix: &str,
    selections: &[&str],
    spaces: &str,
    suffix: &str,
    ext: &str,
) -> String {
    let mut name = String::from(prefix);
    for selection in selections {
        name.push('_');
        name.push_str(&clean_selection(selection, spaces));
    }
    name.push_str(suffix);
    if !ext.is_empty() {
        name.push('.');
        name.push_str(ext);
    }
    name
}
