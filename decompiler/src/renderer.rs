//! Serializes a parsed class, its members, and the reconstructed method
//! bodies into source-like text.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use itertools::Itertools;

use decaf_reader::{
    class_access_flags::ClassAccessFlags,
    class_file::ClassFile,
    class_file_field::{ClassFileField, FieldConstantValue},
    class_file_method::ClassFileMethod,
    field_flags::FieldFlags,
    field_type::{BaseType, FieldType},
    instruction::{LoadedConstant, MethodOperand},
    method_flags::MethodFlags,
    program_counter::ProgramCounter,
};

use crate::{
    class_info::Resolution,
    expression::{ComparisonOp, Expr, InvokeKind, Stmt},
    reconstruction::MethodArtifacts,
    stack_simulation::{class_reference_type, parameter_slots},
    structuring::{LabeledBlock, MethodBody, StructuredStmt, Transfer},
};

/// Controls over the emitted text.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// One indentation level
    pub indent: String,
    /// Whether compiler-generated members are included
    pub include_synthetic: bool,
}

impl Default for RenderOptions {
    fn default() -> RenderOptions {
        RenderOptions {
            indent: "    ".to_string(),
            include_synthetic: false,
        }
    }
}

/// Renders the class declaration with all of its members. The method
/// bodies run parallel to `class_file.methods`; `None` marks a method
/// without code.
pub fn render_class(
    class_file: &ClassFile,
    bodies: &[Option<MethodArtifacts>],
    resolutions: &HashMap<String, Resolution>,
    options: &RenderOptions,
) -> String {
    let renderer = ClassRenderer {
        class_file,
        resolutions,
        options,
    };
    renderer.render(bodies)
}

struct ClassRenderer<'a> {
    class_file: &'a ClassFile,
    resolutions: &'a HashMap<String, Resolution>,
    options: &'a RenderOptions,
}

impl<'a> ClassRenderer<'a> {
    fn render(&self, bodies: &[Option<MethodArtifacts>]) -> String {
        let mut out = String::new();
        self.header(&mut out);
        self.declaration(&mut out);

        let fields: Vec<&ClassFileField> = self
            .class_file
            .fields
            .iter()
            .filter(|field| self.options.include_synthetic || !field.is_synthetic())
            .collect();
        for field in &fields {
            self.field(&mut out, field);
        }

        let mut separate = !fields.is_empty();
        for (index, method) in self.class_file.methods.iter().enumerate() {
            if !self.options.include_synthetic
                && method
                    .flags
                    .intersects(MethodFlags::SYNTHETIC | MethodFlags::BRIDGE)
            {
                continue;
            }
            if separate {
                out.push('\n');
            }
            separate = true;
            self.method(&mut out, method, bodies.get(index).and_then(Option::as_ref));
        }
        out.push_str("}\n");
        out
    }

    fn header(&self, out: &mut String) {
        let source = match &self.class_file.source_file {
            Some(source_file) => source_file.clone(),
            None => format!("{}.class", simple_name(&self.class_file.name)),
        };
        out.push_str(&format!("// Decompiled from {source}\n"));
        let unresolved: Vec<String> = self
            .resolutions
            .iter()
            .filter(|(_, resolution)| matches!(resolution, Resolution::Unresolved))
            .map(|(name, _)| name.replace('/', "."))
            .sorted()
            .collect();
        if !unresolved.is_empty() {
            out.push_str(&format!(
                "// Unresolved references: {}\n",
                unresolved.join(", ")
            ));
        }
        if let Some(package) = package_of(&self.class_file.name) {
            out.push_str(&format!("package {package};\n"));
        }
        out.push('\n');
    }

    fn declaration(&self, out: &mut String) {
        if self.class_file.deprecated {
            out.push_str("@Deprecated\n");
        }
        let flags = self.class_file.flags;
        let mut line = String::new();
        if flags.contains(ClassAccessFlags::PUBLIC) {
            line.push_str("public ");
        }
        if flags.contains(ClassAccessFlags::ABSTRACT) && !self.class_file.is_interface() {
            line.push_str("abstract ");
        }
        if flags.contains(ClassAccessFlags::FINAL) && !self.class_file.is_enum() {
            line.push_str("final ");
        }
        if flags.contains(ClassAccessFlags::ANNOTATION) {
            line.push_str("@interface");
        } else if self.class_file.is_interface() {
            line.push_str("interface");
        } else if self.class_file.is_enum() {
            line.push_str("enum");
        } else {
            line.push_str("class");
        }
        line.push(' ');
        line.push_str(simple_name(&self.class_file.name));
        if let Some(superclass) = &self.class_file.superclass {
            let implied = superclass == "java/lang/Object"
                || (self.class_file.is_enum() && superclass == "java/lang/Enum");
            if !implied {
                line.push_str(&format!(" extends {}", self.class_name(superclass)));
            }
        }
        if !self.class_file.interfaces.is_empty() {
            let keyword = if self.class_file.is_interface() {
                "extends"
            } else {
                "implements"
            };
            let interfaces = self
                .class_file
                .interfaces
                .iter()
                .map(|name| self.class_name(name))
                .join(", ");
            line.push_str(&format!(" {keyword} {interfaces}"));
        }
        out.push_str(&line);
        out.push_str(" {\n");
    }

    fn field(&self, out: &mut String, field: &ClassFileField) {
        let indent = &self.options.indent;
        if field.deprecated {
            out.push_str(&format!("{indent}@Deprecated\n"));
        }
        let mut line = field_modifiers(field.flags);
        line.push_str(&self.type_name(&field.type_descriptor));
        line.push(' ');
        line.push_str(&field.name);
        if let Some(value) = &field.constant_value {
            line.push_str(" = ");
            line.push_str(&constant_value_text(value, &field.type_descriptor));
        }
        out.push_str(&format!("{indent}{line};\n"));
    }

    fn method(
        &self,
        out: &mut String,
        method: &ClassFileMethod,
        artifacts: Option<&MethodArtifacts>,
    ) {
        let indent = &self.options.indent;
        if method.deprecated {
            out.push_str(&format!("{indent}@Deprecated\n"));
        }
        let signature = self.method_signature(method);
        if method.code.is_none() {
            out.push_str(&format!("{indent}{signature};\n"));
            return;
        }
        out.push_str(&format!("{indent}{signature} {{\n"));
        match artifacts {
            Some(artifacts) => {
                let mut body = MethodRenderer::new(self, method, artifacts);
                body.render(out);
            }
            None => out.push_str(&format!("{indent}{indent}// body unavailable\n")),
        }
        out.push_str(&format!("{indent}}}\n"));
    }

    fn method_signature(&self, method: &ClassFileMethod) -> String {
        if method.name == "<clinit>" {
            return "static".to_string();
        }
        let mut line = method_modifiers(method.flags);
        let descriptor = &method.parsed_type_descriptor;
        if method.name == "<init>" {
            line.push_str(simple_name(&self.class_file.name));
        } else {
            match &descriptor.return_type {
                Some(return_type) => line.push_str(&self.type_name(return_type)),
                None => line.push_str("void"),
            }
            line.push(' ');
            line.push_str(&method.name);
        }
        let parameters = parameter_slots(descriptor, method.is_static())
            .into_iter()
            .map(|(slot, parameter)| format!("{} var{slot}", self.type_name(&parameter)))
            .join(", ");
        line.push('(');
        line.push_str(&parameters);
        line.push(')');
        line
    }

    /// Archive classes render with their full dotted name, external ones
    /// with the simple name only.
    fn class_name(&self, internal_name: &str) -> String {
        match self.resolutions.get(internal_name) {
            Some(Resolution::External) => simple_name(internal_name).to_string(),
            _ => internal_name.replace('/', "."),
        }
    }

    fn type_name(&self, field_type: &FieldType) -> String {
        match field_type {
            FieldType::Base(base) => base.to_string(),
            FieldType::Object(name) => self.class_name(name),
            FieldType::Array(component) => format!("{}[]", self.type_name(component)),
        }
    }
}

struct MethodRenderer<'a> {
    class: &'a ClassRenderer<'a>,
    method: &'a ClassFileMethod,
    artifacts: &'a MethodArtifacts,
    declared: BTreeSet<u16>,
}

impl<'a> MethodRenderer<'a> {
    fn new(
        class: &'a ClassRenderer<'a>,
        method: &'a ClassFileMethod,
        artifacts: &'a MethodArtifacts,
    ) -> MethodRenderer<'a> {
        let mut declared = BTreeSet::new();
        if !method.is_static() {
            declared.insert(0);
        }
        for (slot, _) in parameter_slots(&method.parsed_type_descriptor, method.is_static()) {
            declared.insert(slot);
        }
        MethodRenderer {
            class,
            method,
            artifacts,
            declared,
        }
    }

    fn render(&mut self, out: &mut String) {
        match &self.artifacts.body {
            MethodBody::Structured {
                statements,
                appendix,
            } => {
                self.declare_nested_slots(out, statements);
                self.statements(out, statements, 2);
                let labels = referenced_labels(appendix);
                for block in appendix {
                    self.labeled_block(out, block, &labels, 2);
                }
            }
            MethodBody::Labeled(blocks) => {
                self.line(
                    out,
                    2,
                    "// control flow does not reduce to structured statements",
                );
                let labels = referenced_labels(blocks);
                for block in blocks {
                    self.labeled_block(out, block, &labels, 2);
                }
            }
            MethodBody::Dumped { reason, lines } => {
                self.line(out, 2, &format!("// could not reconstruct: {reason}"));
                for line in lines {
                    self.line(out, 2, &format!("//   {line}"));
                }
            }
        }
    }

    /// Slots whose first write sits inside a branch or loop need their
    /// declaration hoisted to the top of the method.
    fn declare_nested_slots(&mut self, out: &mut String, statements: &[StructuredStmt]) {
        let mut first_depth: BTreeMap<u16, usize> = BTreeMap::new();
        collect_store_depths(statements, 0, &mut first_depth);
        let nested: Vec<u16> = first_depth
            .iter()
            .filter(|(slot, depth)| **depth > 0 && !self.declared.contains(*slot))
            .map(|(slot, _)| *slot)
            .collect();
        for slot in nested {
            let declaration = format!("{} var{slot};", self.slot_type(slot));
            self.line(out, 2, &declaration);
            self.declared.insert(slot);
        }
    }

    fn statements(&mut self, out: &mut String, statements: &[StructuredStmt], depth: usize) {
        for statement in statements {
            self.structured(out, statement, depth);
        }
    }

    fn structured(&mut self, out: &mut String, statement: &StructuredStmt, depth: usize) {
        match statement {
            StructuredStmt::Plain(statement) => {
                let text = self.statement_text(statement);
                self.line(out, depth, &text);
            }
            StructuredStmt::If {
                condition,
                then_body,
                else_body,
            } => {
                let head = format!("if ({}) {{", self.condition_text(condition));
                self.line(out, depth, &head);
                self.statements(out, then_body, depth + 1);
                self.else_arm(out, else_body, depth);
            }
            StructuredStmt::While { condition, body } => {
                let head = match condition {
                    Some(condition) => format!("while ({}) {{", self.condition_text(condition)),
                    None => "while (true) {".to_string(),
                };
                self.line(out, depth, &head);
                self.statements(out, body, depth + 1);
                self.line(out, depth, "}");
            }
            StructuredStmt::Switch {
                selector,
                cases,
                default,
            } => {
                let head = format!("switch ({}) {{", self.expr(selector));
                self.line(out, depth, &head);
                for case in cases {
                    for key in &case.keys {
                        self.line(out, depth, &format!("case {key}:"));
                    }
                    self.case_body(out, &case.body, depth + 1);
                }
                if let Some(default) = default {
                    self.line(out, depth, "default:");
                    self.case_body(out, default, depth + 1);
                }
                self.line(out, depth, "}");
            }
            StructuredStmt::Break => self.line(out, depth, "break;"),
            StructuredStmt::Continue => self.line(out, depth, "continue;"),
        }
    }

    fn else_arm(&mut self, out: &mut String, else_body: &[StructuredStmt], depth: usize) {
        if else_body.is_empty() {
            self.line(out, depth, "}");
            return;
        }
        if let [StructuredStmt::If {
            condition,
            then_body,
            else_body,
        }] = else_body
        {
            let head = format!("}} else if ({}) {{", self.condition_text(condition));
            self.line(out, depth, &head);
            self.statements(out, then_body, depth + 1);
            self.else_arm(out, else_body, depth);
            return;
        }
        self.line(out, depth, "} else {");
        self.statements(out, else_body, depth + 1);
        self.line(out, depth, "}");
    }

    fn case_body(&mut self, out: &mut String, body: &[StructuredStmt], depth: usize) {
        self.statements(out, body, depth);
        if !ends_in_jump(body) {
            self.line(out, depth, "break;");
        }
    }

    fn labeled_block(
        &mut self,
        out: &mut String,
        block: &LabeledBlock,
        labels: &BTreeSet<ProgramCounter>,
        depth: usize,
    ) {
        match &block.handler {
            Some(Some(class_name)) => {
                let label = format!(
                    "L{}: // catches {}",
                    block.label,
                    self.class.class_name(class_name)
                );
                self.line(out, depth, &label);
            }
            Some(None) => self.line(out, depth, &format!("L{}: // catches all", block.label)),
            None if labels.contains(&block.label) || block.dump.is_some() => {
                self.line(out, depth, &format!("L{}:", block.label))
            }
            None => {}
        }
        if let Some(dump) = &block.dump {
            self.line(out, depth, &format!("// {}", dump.reason));
            for line in &dump.lines {
                self.line(out, depth, &format!("//   {line}"));
            }
            return;
        }
        for statement in &block.statements {
            let text = self.statement_text(statement);
            self.line(out, depth, &text);
        }
        for transfer in &block.transfers {
            let text = self.transfer_text(transfer);
            self.line(out, depth, &text);
        }
    }

    fn transfer_text(&self, transfer: &Transfer) -> String {
        match transfer {
            Transfer::Goto(target) => format!("goto L{target};"),
            Transfer::ConditionalGoto { condition, target } => {
                format!("if ({}) goto L{target};", self.condition_text(condition))
            }
            Transfer::SwitchGoto { selector, targets } => {
                let arms = targets
                    .iter()
                    .map(|(key, target)| match key {
                        Some(key) => format!("case {key}: goto L{target};"),
                        None => format!("default: goto L{target};"),
                    })
                    .join(" ");
                format!("switch ({}) {{ {arms} }}", self.expr(selector))
            }
            Transfer::SubroutineCall { target, resume } => {
                format!("jsr L{target}; // resumes at L{resume}")
            }
            Transfer::SubroutineReturn => "ret;".to_string(),
        }
    }

    fn statement_text(&mut self, statement: &Stmt) -> String {
        match statement {
            Stmt::LocalStore { index, name, value } => {
                let expected = self
                    .artifacts
                    .local_types
                    .get(index)
                    .and_then(|slot_type| slot_type.as_ref());
                let value_text = self.typed_value(value, expected);
                if self.declared.insert(*index) {
                    format!("{} {name} = {value_text};", self.slot_type(*index))
                } else {
                    format!("{name} = {value_text};")
                }
            }
            Stmt::FieldPut {
                object,
                field,
                value,
            } => format!(
                "{}.{} = {};",
                self.operand(object),
                field.field_name,
                self.typed_value(value, Some(&field.field_type))
            ),
            Stmt::StaticFieldPut { field, value } => format!(
                "{}.{} = {};",
                self.class.class_name(&field.class_name),
                field.field_name,
                self.typed_value(value, Some(&field.field_type))
            ),
            Stmt::ArrayPut {
                array,
                index,
                value,
            } => format!(
                "{}[{}] = {};",
                self.operand(array),
                self.expr(index),
                self.expr(value)
            ),
            Stmt::Expression(expression) => format!("{};", self.expr(expression)),
            Stmt::Increment { name, delta } => match *delta {
                1 => format!("{name}++;"),
                -1 => format!("{name}--;"),
                delta if delta < 0 => format!("{name} -= {};", -i32::from(delta)),
                delta => format!("{name} += {delta};"),
            },
            Stmt::Return(None) => "return;".to_string(),
            Stmt::Return(Some(value)) => {
                let expected = self.method.parsed_type_descriptor.return_type.as_ref();
                format!("return {};", self.typed_value(value, expected))
            }
            Stmt::Throw(value) => format!("throw {};", self.expr(value)),
            Stmt::MonitorEnter(value) => format!("// monitorenter ({})", self.expr(value)),
            Stmt::MonitorExit(value) => format!("// monitorexit ({})", self.expr(value)),
        }
    }

    /// Integer literals flowing into boolean slots read back as the
    /// booleans the compiler erased.
    fn typed_value(&self, value: &Expr, expected: Option<&FieldType>) -> String {
        if expected == Some(&FieldType::Base(BaseType::Boolean)) {
            if let Expr::Literal(LoadedConstant::Integer(value)) = value {
                return boolean_text(*value);
            }
        }
        self.expr(value)
    }

    fn condition_text(&self, condition: &Expr) -> String {
        if let Expr::Comparison { op, left, right } = condition {
            let boolean_operand = **right == Expr::Literal(LoadedConstant::Integer(0))
                && left.static_type() == Some(FieldType::Base(BaseType::Boolean));
            if boolean_operand {
                match op {
                    ComparisonOp::Ne => return self.expr(left),
                    ComparisonOp::Eq => return format!("!{}", self.operand(left)),
                    _ => {}
                }
            }
        }
        self.expr(condition)
    }

    fn expr(&self, expression: &Expr) -> String {
        match expression {
            Expr::Literal(LoadedConstant::Class(name)) => {
                format!("{}.class", self.class.class_name(name))
            }
            Expr::Literal(constant) => constant.to_string(),
            Expr::Null => "null".to_string(),
            Expr::This => "this".to_string(),
            Expr::Super => "super".to_string(),
            Expr::Local { name, .. } => name.clone(),
            Expr::CaughtException(Some(class_name)) => {
                format!("<caught {}>", self.class.class_name(class_name))
            }
            Expr::CaughtException(None) => "<caught>".to_string(),
            Expr::FieldGet { object, field } => {
                format!("{}.{}", self.operand(object), field.field_name)
            }
            Expr::StaticFieldGet { field } => format!(
                "{}.{}",
                self.class.class_name(&field.class_name),
                field.field_name
            ),
            Expr::ArrayGet { array, index } => {
                format!("{}[{}]", self.operand(array), self.expr(index))
            }
            Expr::ArrayLength(array) => format!("{}.length", self.operand(array)),
            Expr::Binary { op, left, right } => format!(
                "{} {} {}",
                self.operand(left),
                op.as_str(),
                self.operand(right)
            ),
            Expr::Negate(value) => format!("-{}", self.operand(value)),
            Expr::Comparison { op, left, right } => format!(
                "{} {} {}",
                self.operand(left),
                op.as_str(),
                self.operand(right)
            ),
            Expr::CompareValue { left, right } => {
                format!("compare({}, {})", self.expr(left), self.expr(right))
            }
            Expr::Invoke {
                kind,
                receiver,
                method,
                arguments,
            } => self.invoke(*kind, receiver.as_deref(), method, arguments),
            Expr::DynamicInvoke { name, arguments } => {
                format!("{name}({})", self.arguments(arguments))
            }
            Expr::New {
                class_name,
                arguments,
            } => format!(
                "new {}({})",
                self.class.class_name(class_name),
                self.arguments(arguments)
            ),
            Expr::UninitializedNew { class_name, .. } => {
                format!("<uninitialized {}>", self.class.class_name(class_name))
            }
            Expr::NewArray { element, length } => self.new_array(element, length),
            Expr::NewMultiArray {
                class_name,
                lengths,
            } => self.new_multi_array(class_name, lengths),
            Expr::Cast { target, value } => format!(
                "({}) {}",
                self.class.type_name(target),
                self.operand(value)
            ),
            Expr::InstanceOf { class_name, value } => format!(
                "{} instanceof {}",
                self.operand(value),
                self.class.class_name(class_name)
            ),
            Expr::Opaque(text) => text.clone(),
        }
    }

    fn invoke(
        &self,
        kind: InvokeKind,
        receiver: Option<&Expr>,
        method: &MethodOperand,
        arguments: &[Expr],
    ) -> String {
        let arguments = self.arguments(arguments);
        if method.method_name == "<init>" {
            return match receiver {
                Some(Expr::This) => format!("this({arguments})"),
                Some(Expr::Super) => format!("super({arguments})"),
                Some(receiver) => format!("{}.<init>({arguments})", self.operand(receiver)),
                None => format!("<init>({arguments})"),
            };
        }
        match (kind, receiver) {
            (InvokeKind::Static, _) => format!(
                "{}.{}({arguments})",
                self.class.class_name(&method.class_name),
                method.method_name
            ),
            (_, Some(Expr::This)) => format!("{}({arguments})", method.method_name),
            (_, Some(receiver)) => {
                format!("{}.{}({arguments})", self.operand(receiver), method.method_name)
            }
            (_, None) => format!("{}({arguments})", method.method_name),
        }
    }

    fn arguments(&self, arguments: &[Expr]) -> String {
        arguments
            .iter()
            .map(|argument| self.expr(argument))
            .join(", ")
    }

    /// `new int[n]`, with any component dimensions after the length.
    fn new_array(&self, element: &FieldType, length: &Expr) -> String {
        let mut base = element;
        let mut suffix = String::new();
        while let FieldType::Array(component) = base {
            suffix.push_str("[]");
            base = component;
        }
        format!(
            "new {}[{}]{suffix}",
            self.class.type_name(base),
            self.expr(length)
        )
    }

    fn new_multi_array(&self, class_name: &str, lengths: &[Expr]) -> String {
        let mut base = class_reference_type(class_name);
        let mut dimensions = 0usize;
        while let FieldType::Array(component) = base {
            dimensions += 1;
            base = *component;
        }
        let mut text = format!("new {}", self.class.type_name(&base));
        for length in lengths {
            text.push_str(&format!("[{}]", self.expr(length)));
        }
        for _ in lengths.len()..dimensions {
            text.push_str("[]");
        }
        text
    }

    /// Wraps compound operands so operator nesting stays readable.
    fn operand(&self, expression: &Expr) -> String {
        if needs_parentheses(expression) {
            format!("({})", self.expr(expression))
        } else {
            self.expr(expression)
        }
    }

    fn slot_type(&self, slot: u16) -> String {
        match self.artifacts.local_types.get(&slot) {
            Some(Some(field_type)) => self.class.type_name(field_type),
            _ => "Object".to_string(),
        }
    }

    fn line(&self, out: &mut String, depth: usize, text: &str) {
        for _ in 0..depth {
            out.push_str(&self.class.options.indent);
        }
        out.push_str(text);
        out.push('\n');
    }
}

fn needs_parentheses(expression: &Expr) -> bool {
    matches!(
        expression,
        Expr::Binary { .. }
            | Expr::Comparison { .. }
            | Expr::Cast { .. }
            | Expr::InstanceOf { .. }
            | Expr::Negate(_)
    )
}

fn ends_in_jump(body: &[StructuredStmt]) -> bool {
    matches!(
        body.last(),
        Some(StructuredStmt::Plain(Stmt::Return(_)))
            | Some(StructuredStmt::Plain(Stmt::Throw(_)))
            | Some(StructuredStmt::Break)
            | Some(StructuredStmt::Continue)
    )
}

fn referenced_labels(blocks: &[LabeledBlock]) -> BTreeSet<ProgramCounter> {
    let mut labels = BTreeSet::new();
    for block in blocks {
        for transfer in &block.transfers {
            match transfer {
                Transfer::Goto(target) => {
                    labels.insert(*target);
                }
                Transfer::ConditionalGoto { target, .. } => {
                    labels.insert(*target);
                }
                Transfer::SwitchGoto { targets, .. } => {
                    labels.extend(targets.iter().map(|(_, target)| *target));
                }
                Transfer::SubroutineCall { target, resume } => {
                    labels.insert(*target);
                    labels.insert(*resume);
                }
                Transfer::SubroutineReturn => {}
            }
        }
    }
    labels
}

fn collect_store_depths(
    statements: &[StructuredStmt],
    depth: usize,
    found: &mut BTreeMap<u16, usize>,
) {
    for statement in statements {
        match statement {
            StructuredStmt::Plain(Stmt::LocalStore { index, .. }) => {
                found.entry(*index).or_insert(depth);
            }
            StructuredStmt::Plain(_) => {}
            StructuredStmt::If {
                then_body,
                else_body,
                ..
            } => {
                collect_store_depths(then_body, depth + 1, found);
                collect_store_depths(else_body, depth + 1, found);
            }
            StructuredStmt::While { body, .. } => collect_store_depths(body, depth + 1, found),
            StructuredStmt::Switch { cases, default, .. } => {
                for case in cases {
                    collect_store_depths(&case.body, depth + 1, found);
                }
                if let Some(default) = default {
                    collect_store_depths(default, depth + 1, found);
                }
            }
            StructuredStmt::Break | StructuredStmt::Continue => {}
        }
    }
}

fn field_modifiers(flags: FieldFlags) -> String {
    let mut parts = Vec::new();
    if flags.contains(FieldFlags::PUBLIC) {
        parts.push("public");
    }
    if flags.contains(FieldFlags::PROTECTED) {
        parts.push("protected");
    }
    if flags.contains(FieldFlags::PRIVATE) {
        parts.push("private");
    }
    if flags.contains(FieldFlags::STATIC) {
        parts.push("static");
    }
    if flags.contains(FieldFlags::FINAL) {
        parts.push("final");
    }
    if flags.contains(FieldFlags::VOLATILE) {
        parts.push("volatile");
    }
    if flags.contains(FieldFlags::TRANSIENT) {
        parts.push("transient");
    }
    joined_modifiers(parts)
}

fn method_modifiers(flags: MethodFlags) -> String {
    let mut parts = Vec::new();
    if flags.contains(MethodFlags::PUBLIC) {
        parts.push("public");
    }
    if flags.contains(MethodFlags::PROTECTED) {
        parts.push("protected");
    }
    if flags.contains(MethodFlags::PRIVATE) {
        parts.push("private");
    }
    if flags.contains(MethodFlags::ABSTRACT) {
        parts.push("abstract");
    }
    if flags.contains(MethodFlags::STATIC) {
        parts.push("static");
    }
    if flags.contains(MethodFlags::FINAL) {
        parts.push("final");
    }
    if flags.contains(MethodFlags::SYNCHRONIZED) {
        parts.push("synchronized");
    }
    if flags.contains(MethodFlags::NATIVE) {
        parts.push("native");
    }
    if flags.contains(MethodFlags::STRICT) {
        parts.push("strictfp");
    }
    joined_modifiers(parts)
}

fn joined_modifiers(parts: Vec<&str>) -> String {
    let mut text = parts.join(" ");
    if !text.is_empty() {
        text.push(' ');
    }
    text
}

fn constant_value_text(value: &FieldConstantValue, field_type: &FieldType) -> String {
    match value {
        FieldConstantValue::Int(value) => {
            if *field_type == FieldType::Base(BaseType::Boolean) {
                boolean_text(*value)
            } else {
                value.to_string()
            }
        }
        FieldConstantValue::Float(value) => format!("{value}f"),
        FieldConstantValue::Long(value) => format!("{value}L"),
        FieldConstantValue::Double(value) => format!("{value}"),
        FieldConstantValue::String(value) => format!("{value:?}"),
    }
}

fn boolean_text(value: i32) -> String {
    (if value != 0 { "true" } else { "false" }).to_string()
}

fn simple_name(internal_name: &str) -> &str {
    internal_name.rsplit('/').next().unwrap_or(internal_name)
}

fn package_of(internal_name: &str) -> Option<String> {
    internal_name
        .rsplit_once('/')
        .map(|(package, _)| package.replace('/', "."))
}
