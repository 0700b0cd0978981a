//! C back-end: pretty-prints the AST as a C translation unit.
//!
//! The output leans on the C standard library (printf/scanf/malloc) and maps
//! the GUI statements onto raylib calls. Headers are gathered while the body
//! is generated and emitted at the top afterwards, so includes pulled in by
//! expressions (string.h, stdlib.h) are never missed.

use crate::ast::{
    BaseType, Expr, ExprKind, FileMode, FunctionDef, Program, Stmt, StmtKind, StructDef, TypeSpec,
};
use std::collections::{BTreeSet, HashMap};

pub struct Transpiler {
    indent: usize,
    lines: Vec<String>,
    includes: BTreeSet<String>,
    struct_names: BTreeSet<String>,
    /// Statically known array lengths, per function.
    array_sizes: HashMap<String, usize>,
    /// Declared variable types, per function; drives printf/scanf formats
    /// and `->` vs `.` member access.
    var_types: HashMap<String, TypeSpec>,
}

/// Transpile a parsed program to C source.
pub fn transpile(program: &Program) -> String {
    Transpiler::new().transpile(program)
}

impl Transpiler {
    pub fn new() -> Transpiler {
        Transpiler {
            indent: 0,
            lines: Vec::new(),
            includes: BTreeSet::new(),
            struct_names: BTreeSet::new(),
            array_sizes: HashMap::new(),
            var_types: HashMap::new(),
        }
    }

    fn emit(&mut self, line: impl Into<String>) {
        let mut s = "    ".repeat(self.indent);
        s.push_str(&line.into());
        self.lines.push(s);
    }

    fn emit_raw(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn transpile(mut self, program: &Program) -> String {
        for include in &program.includes {
            self.includes.insert(include.library.clone());
        }
        // printf/scanf are always needed
        self.includes.insert("stdio".to_string());

        for def in &program.structs {
            self.struct_names.insert(def.name.clone());
            self.transpile_struct(def);
        }

        for func in &program.functions {
            if !func.is_main {
                self.emit_forward_decl(func);
            }
        }
        if !program.functions.is_empty() {
            self.emit_raw("");
        }

        for func in &program.functions {
            self.transpile_function(func);
            self.emit_raw("");
        }

        let mut output = Vec::new();
        for include in &self.includes {
            if include == "raylib" {
                output.push("#include \"raylib.h\"".to_string());
            } else {
                output.push(format!("#include <{}.h>", include));
            }
        }
        output.push(String::new());
        output.extend(self.lines);
        output.join("\n")
    }

    fn emit_forward_decl(&mut self, func: &FunctionDef) {
        let return_type = func
            .return_type
            .as_ref()
            .map(|t| self.type_to_c(Some(t)))
            .unwrap_or_else(|| "void".to_string());
        let params = self.param_list(func);
        self.emit_raw(format!("{} {}({});", return_type, func.name, params));
    }

    fn param_list(&mut self, func: &FunctionDef) -> String {
        if func.params.is_empty() {
            return "void".to_string();
        }
        func.params
            .iter()
            .map(|p| format!("{} {}", self.type_to_c(p.var_type.as_ref()), p.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn transpile_struct(&mut self, def: &StructDef) {
        self.emit_raw("typedef struct {");
        self.indent += 1;
        for field in &def.fields {
            let field_type = self.type_to_c(field.var_type.as_ref());
            self.emit(format!("{} {};", field_type, field.name));
        }
        self.indent -= 1;
        self.emit_raw(format!("}} {};", def.name));
        self.emit_raw("");
    }

    fn transpile_function(&mut self, func: &FunctionDef) {
        self.var_types = HashMap::new();
        self.array_sizes = HashMap::new();

        for param in &func.params {
            if let Some(ty) = &param.var_type {
                self.var_types.insert(param.name.clone(), ty.clone());
            }
        }

        if func.is_main {
            self.emit_raw("int main(void) {");
        } else {
            let return_type = func
                .return_type
                .as_ref()
                .map(|t| self.type_to_c(Some(t)))
                .unwrap_or_else(|| "void".to_string());
            let params = self.param_list(func);
            self.emit_raw(format!("{} {}({}) {{", return_type, func.name, params));
        }

        self.indent += 1;
        for stmt in &func.body {
            self.transpile_statement(stmt);
        }
        if func.is_main {
            let ends_in_return = matches!(
                func.body.last().map(|s| &s.kind),
                Some(StmtKind::Return { .. })
            );
            if !ends_in_return {
                self.emit("return 0;");
            }
        }
        self.indent -= 1;
        self.emit_raw("}");
    }

    fn type_to_c(&self, ty: Option<&TypeSpec>) -> String {
        let Some(ty) = ty else {
            return "int".to_string();
        };

        let mut base = match ty.base {
            BaseType::Number => "int".to_string(),
            BaseType::Decimal => "double".to_string(),
            BaseType::Text => "char*".to_string(),
            BaseType::Letter => "char".to_string(),
            BaseType::Boolean => "int".to_string(),
            BaseType::Nothing => "void".to_string(),
            BaseType::File => "FILE*".to_string(),
            BaseType::Struct => ty.struct_name.clone().unwrap_or_else(|| "int".to_string()),
        };

        if ty.is_pointer {
            base.push('*');
        }
        base
    }

    fn transpile_statement(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl(decl) => self.transpile_var_decl(decl),
            StmtKind::Assign { target, value } => {
                let target = self.transpile_expression(target);
                let value = self.transpile_expression(value);
                self.emit(format!("{} = {};", target, value));
            }
            StmtKind::If {
                condition,
                then_body,
                else_ifs,
                else_body,
            } => {
                let cond = self.transpile_expression(condition);
                self.emit(format!("if ({}) {{", cond));
                self.indent += 1;
                for s in then_body {
                    self.transpile_statement(s);
                }
                self.indent -= 1;

                for clause in else_ifs {
                    let cond = self.transpile_expression(&clause.condition);
                    self.emit(format!("}} else if ({}) {{", cond));
                    self.indent += 1;
                    for s in &clause.body {
                        self.transpile_statement(s);
                    }
                    self.indent -= 1;
                }

                if !else_body.is_empty() {
                    self.emit("} else {");
                    self.indent += 1;
                    for s in else_body {
                        self.transpile_statement(s);
                    }
                    self.indent -= 1;
                }

                self.emit("}");
            }
            StmtKind::While { condition, body } => {
                let cond = self.transpile_expression(condition);
                self.emit(format!("while ({}) {{", cond));
                self.indent += 1;
                for s in body {
                    self.transpile_statement(s);
                }
                self.indent -= 1;
                self.emit("}");
            }
            StmtKind::For {
                var,
                start,
                end,
                step,
                body,
            } => {
                let start = self.transpile_expression(start);
                let end = self.transpile_expression(end);
                if *step > 0 {
                    self.emit(format!(
                        "for (int {var} = {start}; {var} <= {end}; {var}++) {{",
                        var = var,
                        start = start,
                        end = end
                    ));
                } else {
                    self.emit(format!(
                        "for (int {var} = {start}; {var} >= {end}; {var}--) {{",
                        var = var,
                        start = start,
                        end = end
                    ));
                }
                self.indent += 1;
                for s in body {
                    self.transpile_statement(s);
                }
                self.indent -= 1;
                self.emit("}");
            }
            StmtKind::ForEach {
                var,
                var_type,
                iterable,
                body,
            } => {
                let iter = self.transpile_expression(iterable);
                let c_type = self.type_to_c(var_type.as_ref());
                let bound = match &iterable.kind {
                    ExprKind::Ident(name) => self
                        .array_sizes
                        .get(name)
                        .map(|n| n.to_string()),
                    _ => None,
                };
                let bound =
                    bound.unwrap_or_else(|| format!("sizeof({iter})/sizeof({iter}[0])", iter = iter));
                self.emit(format!(
                    "for (int __i__ = 0; __i__ < {}; __i__++) {{",
                    bound
                ));
                self.indent += 1;
                self.emit(format!("{} {} = {}[__i__];", c_type, var, iter));
                for s in body {
                    self.transpile_statement(s);
                }
                self.indent -= 1;
                self.emit("}");
            }
            StmtKind::Repeat { count, body } => {
                let count = self.transpile_expression(count);
                self.emit(format!(
                    "for (int __rep__ = 0; __rep__ < {}; __rep__++) {{",
                    count
                ));
                self.indent += 1;
                for s in body {
                    self.transpile_statement(s);
                }
                self.indent -= 1;
                self.emit("}");
            }
            StmtKind::Print { parts } => self.transpile_print(parts),
            StmtKind::Input { target, input_kind } => {
                let target = self.transpile_expression(target);
                match input_kind {
                    crate::ast::InputKind::Number => {
                        self.emit(format!("scanf(\"%d\", &{});", target));
                    }
                    crate::ast::InputKind::Decimal => {
                        self.emit(format!("scanf(\"%lf\", &{});", target));
                    }
                    crate::ast::InputKind::Letter => {
                        self.emit(format!("scanf(\" %c\", &{});", target));
                    }
                    crate::ast::InputKind::Text => {
                        self.emit("char __buf__[256];");
                        self.emit("scanf(\"%255s\", __buf__);");
                        self.emit(format!("{} = __buf__;", target));
                    }
                }
            }
            StmtKind::Return { value } => match value {
                Some(expr) => {
                    let value = self.transpile_expression(expr);
                    self.emit(format!("return {};", value));
                }
                None => self.emit("return;"),
            },
            StmtKind::Break => self.emit("break;"),
            StmtKind::Continue => self.emit("continue;"),
            StmtKind::Free { pointer } => {
                let ptr = self.transpile_expression(pointer);
                self.includes.insert("stdlib".to_string());
                self.emit(format!("free({});", ptr));
            }
            StmtKind::Expr(expr) => {
                let code = self.transpile_expression(expr);
                self.emit(format!("{};", code));
            }

            StmtKind::OpenWindow {
                width,
                height,
                title,
            } => {
                let width = self.transpile_expression(width);
                let height = self.transpile_expression(height);
                let title = title
                    .as_ref()
                    .map(|t| self.transpile_expression(t))
                    .unwrap_or_else(|| "\"Zinc App\"".to_string());
                self.emit(format!("InitWindow({}, {}, {});", width, height, title));
                self.emit("SetTargetFPS(60);");
            }
            StmtKind::CloseWindow => self.emit("CloseWindow();"),
            StmtKind::BeginDrawing => self.emit("BeginDrawing();"),
            StmtKind::EndDrawing => self.emit("EndDrawing();"),
            StmtKind::ClearScreen { color } => {
                self.emit(format!("ClearBackground({});", color));
            }
            StmtKind::DrawRectangle {
                x,
                y,
                width,
                height,
                color,
            } => {
                let x = self.transpile_expression(x);
                let y = self.transpile_expression(y);
                let w = self.transpile_expression(width);
                let h = self.transpile_expression(height);
                self.emit(format!("DrawRectangle({}, {}, {}, {}, {});", x, y, w, h, color));
            }
            StmtKind::DrawText {
                text,
                x,
                y,
                size,
                color,
            } => {
                let text = self.transpile_expression(text);
                let x = self.transpile_expression(x);
                let y = self.transpile_expression(y);
                let size = self.transpile_expression(size);
                self.emit(format!("DrawText({}, {}, {}, {}, {});", text, x, y, size, color));
            }
        }
    }

    fn transpile_var_decl(&mut self, decl: &crate::ast::VarDecl) {
        if decl.is_file {
            match &decl.file_path {
                Some(path) => {
                    let mode = match decl.file_mode {
                        Some(FileMode::Write) => "\"w\"",
                        _ => "\"r\"",
                    };
                    let path = self.transpile_expression(path);
                    self.emit(format!("FILE* {} = fopen({}, {});", decl.name, path, mode));
                }
                None => self.emit(format!("FILE* {} = NULL;", decl.name)),
            }
            return;
        }

        let c_type = self.type_to_c(decl.var_type.as_ref());
        if let Some(ty) = &decl.var_type {
            self.var_types.insert(decl.name.clone(), ty.clone());
        }

        if decl.var_type.as_ref().is_some_and(|t| t.is_array) {
            let elem_type = c_type.trim_end_matches('*').to_string();
            match &decl.init {
                Some(Expr {
                    kind: ExprKind::ArrayLit(elements),
                    ..
                }) => {
                    let size = elements.len();
                    self.array_sizes.insert(decl.name.clone(), size);
                    let values: Vec<String> = elements
                        .iter()
                        .map(|e| self.transpile_expression(e))
                        .collect();
                    self.emit(format!(
                        "{} {}[{}] = {{{}}};",
                        elem_type,
                        decl.name,
                        size,
                        values.join(", ")
                    ));
                }
                _ => match decl.var_type.as_ref().and_then(|t| t.array_size) {
                    Some(size) => {
                        self.array_sizes.insert(decl.name.clone(), size);
                        self.emit(format!("{} {}[{}];", elem_type, decl.name, size));
                    }
                    None => self.emit(format!("{}* {} = NULL;", c_type, decl.name)),
                },
            }
            return;
        }

        match &decl.init {
            Some(init) => {
                let value = self.transpile_expression(init);
                if matches!(init.kind, ExprKind::Allocate { .. }) {
                    self.emit(format!("{}* {} = {};", c_type, decl.name, value));
                } else {
                    self.emit(format!("{} {} = {};", c_type, decl.name, value));
                }
            }
            None => {
                if c_type.ends_with('*') {
                    self.emit(format!("{} {} = NULL;", c_type, decl.name));
                } else if decl
                    .var_type
                    .as_ref()
                    .is_some_and(|t| t.base == BaseType::Struct)
                {
                    self.emit(format!("{} {} = {{0}};", c_type, decl.name));
                } else {
                    self.emit(format!("{} {} = 0;", c_type, decl.name));
                }
            }
        }
    }

    fn transpile_print(&mut self, parts: &[Expr]) {
        let mut format_parts = Vec::new();
        let mut args = Vec::new();

        for part in parts {
            match &part.kind {
                ExprKind::Str(s) => {
                    format_parts.push(escape_c_string(s));
                }
                ExprKind::Number(n) => {
                    format_parts.push("%d".to_string());
                    args.push(n.to_string());
                }
                ExprKind::Decimal(x) => {
                    format_parts.push("%f".to_string());
                    args.push(x.to_string());
                }
                ExprKind::Char(c) => {
                    format_parts.push("%c".to_string());
                    args.push(format!("'{}'", c));
                }
                ExprKind::Ident(name) => {
                    let spec = match self.var_types.get(name).map(|t| t.base) {
                        Some(BaseType::Text) => "%s",
                        Some(BaseType::Decimal) => "%f",
                        Some(BaseType::Letter) => "%c",
                        _ => "%d",
                    };
                    format_parts.push(spec.to_string());
                    args.push(name.clone());
                }
                _ => {
                    let code = self.transpile_expression(part);
                    format_parts.push("%d".to_string());
                    args.push(code);
                }
            }
        }

        let format = format_parts.join("");
        let args = if args.is_empty() {
            String::new()
        } else {
            format!(", {}", args.join(", "))
        };
        self.emit(format!("printf(\"{}\\n\"{});", format, args));
    }

    fn transpile_expression(&mut self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Number(n) => n.to_string(),
            ExprKind::Decimal(x) => x.to_string(),
            ExprKind::Str(s) => format!("\"{}\"", escape_c_string(s)),
            ExprKind::Char(c) => match c {
                '\n' => "'\\n'".to_string(),
                '\t' => "'\\t'".to_string(),
                _ => format!("'{}'", c),
            },
            ExprKind::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            ExprKind::Null => "NULL".to_string(),
            ExprKind::Ident(name) => name.clone(),
            ExprKind::Binary { op, left, right } => {
                let left = self.transpile_expression(left);
                let right = self.transpile_expression(right);
                format!("({} {} {})", left, op, right)
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.transpile_expression(operand);
                format!("({}{})", op, operand)
            }
            ExprKind::Call { name, args } => self.transpile_call(name, args),
            ExprKind::Index { array, index } => {
                let array_code = self.transpile_expression(array);
                // `last item in` arrives as index -1
                if matches!(index.kind, ExprKind::Number(-1)) {
                    if let ExprKind::Ident(name) = &array.kind {
                        if let Some(size) = self.array_sizes.get(name) {
                            return format!("{}[{}]", array_code, size - 1);
                        }
                    }
                    return format!(
                        "{arr}[sizeof({arr})/sizeof({arr}[0]) - 1]",
                        arr = array_code
                    );
                }
                let index = self.transpile_expression(index);
                format!("{}[{}]", array_code, index)
            }
            ExprKind::Member { object, field } => {
                let obj = self.transpile_expression(object);
                if let ExprKind::Ident(name) = &object.kind {
                    if self.var_types.get(name).is_some_and(|t| t.is_pointer) {
                        return format!("{}->{}", obj, field);
                    }
                }
                format!("{}.{}", obj, field)
            }
            ExprKind::AddressOf(operand) => {
                let operand = self.transpile_expression(operand);
                format!("&{}", operand)
            }
            ExprKind::Deref(operand) => {
                let operand = self.transpile_expression(operand);
                format!("*{}", operand)
            }
            ExprKind::ArrayLit(elements) => {
                let values: Vec<String> = elements
                    .iter()
                    .map(|e| self.transpile_expression(e))
                    .collect();
                format!("{{{}}}", values.join(", "))
            }
            ExprKind::Allocate { count, ty } => {
                self.includes.insert("stdlib".to_string());
                let count = self.transpile_expression(count);
                let c_type = self.type_to_c(Some(ty));
                format!("malloc({} * sizeof({}))", count, c_type)
            }
            ExprKind::Random { min, max } => {
                self.includes.insert("stdlib".to_string());
                self.includes.insert("time".to_string());
                let min = self.transpile_expression(min);
                let max = self.transpile_expression(max);
                format!("(rand() % ({max} - {min} + 1) + {min})", min = min, max = max)
            }
            ExprKind::WindowShouldClose => "WindowShouldClose()".to_string(),
            ExprKind::MouseX => "GetMouseX()".to_string(),
            ExprKind::MouseY => "GetMouseY()".to_string(),
            ExprKind::MousePressed => "IsMouseButtonPressed(MOUSE_LEFT_BUTTON)".to_string(),
        }
    }

    fn transpile_call(&mut self, name: &str, args: &[Expr]) -> String {
        match name {
            "__len__" => {
                let Some(arg) = args.first() else {
                    return "0".to_string();
                };
                if let ExprKind::Ident(var) = &arg.kind {
                    if let Some(size) = self.array_sizes.get(var) {
                        return size.to_string();
                    }
                }
                let arr = self.transpile_expression(arg);
                format!("(sizeof({arr})/sizeof({arr}[0]))", arr = arr)
            }
            "__has_line__" => match args.first() {
                Some(file) => {
                    let file = self.transpile_expression(file);
                    format!("!feof({})", file)
                }
                None => "0".to_string(),
            },
            "__read_line__" => {
                if args.len() >= 2 {
                    let file = self.transpile_expression(&args[0]);
                    let target = self.transpile_expression(&args[1]);
                    format!("fgets({target}, sizeof({target}), {file})", target = target, file = file)
                } else {
                    "NULL".to_string()
                }
            }
            "strstr" => {
                if args.len() >= 2 {
                    self.includes.insert("string".to_string());
                    let haystack = self.transpile_expression(&args[0]);
                    let needle = self.transpile_expression(&args[1]);
                    format!("(strstr({}, {}) != NULL)", haystack, needle)
                } else {
                    "0".to_string()
                }
            }
            "sqrt" | "pow" => {
                self.includes.insert("math".to_string());
                let args: Vec<String> =
                    args.iter().map(|a| self.transpile_expression(a)).collect();
                format!("{}({})", name, args.join(", "))
            }
            _ => {
                let args: Vec<String> =
                    args.iter().map(|a| self.transpile_expression(a)).collect();
                format!("{}({})", name, args.join(", "))
            }
        }
    }
}

impl Default for Transpiler {
    fn default() -> Self {
        Transpiler::new()
    }
}

fn escape_c_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn transpile_source(source: &str) -> String {
        transpile(&parse(source).unwrap())
    }

    #[test]
    fn test_hello_world_c() {
        let c = transpile_source(
            "include the standard input and output\n\nto do the main thing:\nsay \"Hello, World!\"\nend\n",
        );
        assert!(c.contains("#include <stdio.h>"));
        assert!(c.contains("int main(void) {"));
        assert!(c.contains("printf(\"Hello, World!\\n\");"));
        assert!(c.contains("return 0;"));
    }

    #[test]
    fn test_struct_becomes_typedef() {
        let c = transpile_source(
            "define Point as having:\nnumber called x\nnumber called y\nend\n\nto do the main thing:\nsay 1\nend\n",
        );
        assert!(c.contains("typedef struct {"));
        assert!(c.contains("    int x;"));
        assert!(c.contains("} Point;"));
    }

    #[test]
    fn test_counted_for_loop() {
        let c = transpile_source(
            "to do the main thing:\nfor each number i from 1 to 3:\nsay i\nend\nend\n",
        );
        assert!(c.contains("for (int i = 1; i <= 3; i++) {"));
    }

    #[test]
    fn test_descending_for_loop() {
        let c = transpile_source(
            "to do the main thing:\nfor each number i from 3 down to 1:\nsay i\nend\nend\n",
        );
        assert!(c.contains("for (int i = 3; i >= 1; i--) {"));
    }

    #[test]
    fn test_print_uses_declared_types() {
        let c = transpile_source(
            "to do the main thing:\nthere is a text called name which is \"zinc\"\nthere is a decimal called d which is 1.5\nsay name and then d\nend\n",
        );
        assert!(c.contains("printf(\"%s%f\\n\", name, d);"));
    }

    #[test]
    fn test_function_forward_declaration() {
        let c = transpile_source(
            "to twice number called n and return a number:\nreturn n times 2\nend\n\nto do the main thing:\nsay the result of twice 4\nend\n",
        );
        assert!(c.contains("int twice(int n);"));
        assert!(c.contains("int twice(int n) {"));
        assert!(c.contains("return (n * 2);"));
    }

    #[test]
    fn test_random_adds_includes() {
        let c = transpile_source(
            "to do the main thing:\nlet r be a random number between 1 and 6\nsay r\nend\n",
        );
        assert!(c.contains("#include <stdlib.h>"));
        assert!(c.contains("#include <time.h>"));
        assert!(c.contains("(rand() % (6 - 1 + 1) + 1)"));
    }

    #[test]
    fn test_array_declaration_with_initializer() {
        let c = transpile_source(
            "to do the main thing:\nthere is a list of number called xs containing 1, 2, 3\nsay item number 0 in xs\nend\n",
        );
        assert!(c.contains("int xs[3] = {1, 2, 3};"));
        assert!(c.contains("xs[0]"));
    }

    #[test]
    fn test_last_item_uses_static_size() {
        let c = transpile_source(
            "to do the main thing:\nthere is a list of number called xs containing 1, 2, 3\nsay the last item in xs\nend\n",
        );
        assert!(c.contains("xs[2]"));
    }

    #[test]
    fn test_file_declaration_and_read() {
        let c = transpile_source(
            "to do the main thing:\nthere is a file called f which opens \"data.txt\" for reading\nclose the file f\nend\n",
        );
        assert!(c.contains("FILE* f = fopen(\"data.txt\", \"r\");"));
        assert!(c.contains("fclose(f);"));
    }

    #[test]
    fn test_pointer_member_access_uses_arrow() {
        let c = transpile_source(
            "define Point as having:\nnumber called x\nend\n\nto shift a pointer to Point called p:\nchange p's x to 1\nend\n\nto do the main thing:\nsay 1\nend\n",
        );
        assert!(c.contains("p->x = 1;"));
    }

    #[test]
    fn test_gui_statements_map_to_raylib() {
        let c = transpile_source(
            "include the graphics library\n\nto do the main thing:\nopen a window sized 800 by 600 called \"demo\"\nbegin drawing\nclear the screen with white\nend drawing\nclose the window\nend\n",
        );
        assert!(c.contains("#include \"raylib.h\""));
        assert!(c.contains("InitWindow(800, 600, \"demo\");"));
        assert!(c.contains("ClearBackground(WHITE);"));
        assert!(c.contains("CloseWindow();"));
    }

    #[test]
    fn test_sqrt_pulls_math_header() {
        let c = transpile_source(
            "to do the main thing:\nsay the square root of 9\nend\n",
        );
        assert!(c.contains("#include <math.h>"));
        assert!(c.contains("sqrt(9)"));
    }
}
