//! C source fragments shared by every generated kernel: the argument
//! checks, input parsing and the JSON result printer that implement the
//! kernel wire protocol.

use crate::config::ElementType;
use permforge_patterns::join_csv;

pub fn includes(extra: &[&str]) -> Vec<String> {
    let mut lines: Vec<String> = extra.iter().map(|h| format!("#include <{h}>")).collect();
    for header in ["stdio.h", "stdlib.h", "string.h", "time.h"] {
        lines.push(format!("#include <{header}>"));
    }
    lines.push(String::new());
    lines
}

/// `arg_count` and, when present, the baked probe values.
pub fn constants(arg_count: usize, probe: Option<&[i64]>) -> Vec<String> {
    let mut lines = vec![format!("static const int arg_count = {arg_count};")];
    match probe {
        Some(values) => {
            lines.push("#define HAS_PROBE_VALUES 1".to_string());
            lines.push(format!(
                "static const long long probe_values[{arg_count}] = {{{}}};",
                join_csv(values)
            ));
        }
        None => lines.push("#define HAS_PROBE_VALUES 0".to_string()),
    }
    lines.push(String::new());
    lines
}

pub fn helpers(element: ElementType) -> Vec<String> {
    let ty = element.c_name();
    let mut lines = vec![
        "static void fail(const char *message) {".to_string(),
        "    printf(\"{\\\"error\\\": \\\"%s\\\", \\\"code\\\": 1}\\n\", message);".to_string(),
        "    exit(1);".to_string(),
        "}".to_string(),
        String::new(),
    ];
    lines.extend([
        format!("static int parse_input(const char *text, {ty} *output, int expected) {{"),
        "    int index = 0;".to_string(),
        "    const char *cursor = text;".to_string(),
        "    while (*cursor != '\\0') {".to_string(),
        "        char *end = NULL;".to_string(),
        "        long long value = strtoll(cursor, &end, 10);".to_string(),
        "        if (end == cursor || index >= expected) {".to_string(),
        "            return -1;".to_string(),
        "        }".to_string(),
        format!("        output[index++] = ({ty}) value;"),
        "        cursor = end;".to_string(),
        "        if (*cursor == ',') {".to_string(),
        "            cursor++;".to_string(),
        "        } else if (*cursor != '\\0') {".to_string(),
        "            return -1;".to_string(),
        "        }".to_string(),
        "    }".to_string(),
        "    return index;".to_string(),
        "}".to_string(),
        String::new(),
    ]);
    lines
}

/// Opening of `main`: validates argv, allocates `input`/`output` on the host
/// and fills `input` either from argv or from the baked probe values.
pub fn main_prologue(element: ElementType, qualifier: &str) -> Vec<String> {
    let ty = element.c_name();
    let signature = if qualifier.is_empty() {
        "int main(int argc, char **argv) {".to_string()
    } else {
        format!("{qualifier} int main(int argc, char **argv) {{")
    };
    vec![
        signature,
        "    if (argc != 3) {".to_string(),
        "        fail(\"2 arguments required: the number of values and the comma-separated values\");"
            .to_string(),
        "    }".to_string(),
        String::new(),
        "    char *count_end = NULL;".to_string(),
        "    long count = strtol(argv[1], &count_end, 10);".to_string(),
        "    if (count_end == argv[1] || *count_end != '\\0' || count != arg_count) {".to_string(),
        "        printf(\"{\\\"error\\\": \\\"must provide as many inputs as there are arguments (%d vs %ld provided)\\\", \\\"code\\\": 1}\\n\", arg_count, count);".to_string(),
        "        return 1;".to_string(),
        "    }".to_string(),
        String::new(),
        format!("    {ty} *input = ({ty} *) calloc(arg_count, sizeof({ty}));"),
        format!("    {ty} *output = ({ty} *) calloc(arg_count, sizeof({ty}));"),
        "    if (input == NULL || output == NULL) {".to_string(),
        "        fail(\"allocation failed\");".to_string(),
        "    }".to_string(),
        String::new(),
        "#if HAS_PROBE_VALUES".to_string(),
        "    if (strcmp(argv[2], \"-\") == 0) {".to_string(),
        "        for (int i = 0; i < arg_count; i++) {".to_string(),
        format!("            input[i] = ({ty}) probe_values[i];"),
        "        }".to_string(),
        "    } else".to_string(),
        "#endif".to_string(),
        "    if (parse_input(argv[2], input, arg_count) != arg_count) {".to_string(),
        "        fail(\"value list must hold exactly arg_count comma-separated integers\");".to_string(),
        "    }".to_string(),
        String::new(),
    ]
}

/// Prints the success object. `compute_format` and `compute_expr` describe
/// the compute metric, e.g. `("%ld", "(long) ticks")`.
pub fn main_epilogue(element: ElementType, compute_format: &str, compute_expr: &str) -> Vec<String> {
    let value = match element {
        ElementType::Int => "output[i]",
        ElementType::Float => "(int) output[i]",
    };
    vec![
        "    printf(\"{\\\"values\\\": [\");".to_string(),
        "    for (int i = 0; i < arg_count; i++) {".to_string(),
        "        if (i > 0) {".to_string(),
        "            putchar(',');".to_string(),
        "        }".to_string(),
        format!("        printf(\"%d\", {value});"),
        "    }".to_string(),
        format!(
            "    printf(\"], \\\"compute\\\": {compute_format}, \\\"code\\\": 0}}\\n\", {compute_expr});"
        ),
        String::new(),
        "    free(input);".to_string(),
        "    free(output);".to_string(),
        "    return 0;".to_string(),
        "}".to_string(),
    ]
}

/// Host-side timing around a call to `permute(input, output)`.
pub fn clock_timed_permute() -> Vec<String> {
    vec![
        "    clock_t start = clock();".to_string(),
        "    permute(input, output);".to_string(),
        "    clock_t finish = clock();".to_string(),
        String::new(),
    ]
}

pub fn join_lines(lines: Vec<String>) -> String {
    let mut source = lines.join("\n");
    source.push('\n');
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_without_probe_disable_probe_branch() {
        let lines = constants(4, None);
        assert_eq!(lines[0], "static const int arg_count = 4;");
        assert!(lines.contains(&"#define HAS_PROBE_VALUES 0".to_string()));
    }

    #[test]
    fn constants_with_probe_embed_values() {
        let lines = constants(3, Some(&[10, 20, 30]));
        assert!(lines
            .iter()
            .any(|l| l == "static const long long probe_values[3] = {10,20,30};"));
    }

    #[test]
    fn epilogue_prints_protocol_object() {
        let text = main_epilogue(ElementType::Float, "%ld", "(long) (finish - start)").join("\n");
        assert!(text.contains("(int) output[i]"));
        assert!(text.contains(r#"\"compute\": %ld, \"code\": 0}\n", (long) (finish - start));"#));
    }
}
