//! The top level driver: fetches the target class, resolves what it
//! references, reconstructs every method body, and renders the result.

use std::collections::BTreeSet;

use decaf_reader::{
    class_file::ClassFile,
    class_reader,
    field_type::FieldType,
    instruction::{decode_code, Instruction, LoadedConstant, Operand},
    method_descriptor::MethodDescriptor,
};

use crate::{
    class_environment::ClassEnvironment,
    decompile_error::DecompileError,
    reconstruction::{reconstruct_method, MethodArtifacts},
    renderer::{render_class, RenderOptions},
    symbol_resolver::SymbolResolver,
};

/// Decompiles one class into source-like text.
///
/// Fails only when the target itself cannot be fetched or parsed; every
/// other problem degrades into diagnostic text inside the output.
pub async fn decompile<E: ClassEnvironment>(
    class_name: &str,
    environment: E,
) -> Result<String, DecompileError> {
    decompile_with_options(class_name, environment, &RenderOptions::default()).await
}

pub async fn decompile_with_options<E: ClassEnvironment>(
    class_name: &str,
    environment: E,
    options: &RenderOptions,
) -> Result<String, DecompileError> {
    if class_name.is_empty() {
        return Err(DecompileError::ClassNotFound(String::new()));
    }
    let bytes = environment
        .fetch(class_name)
        .await
        .ok_or_else(|| DecompileError::ClassNotFound(class_name.to_string()))?;
    let class_file = class_reader::read_buffer(&bytes)
        .map_err(|error| DecompileError::MalformedClassFile(class_name.to_string(), error))?;

    let mut resolver = SymbolResolver::new(environment);
    resolver.register(&class_file);
    resolver.resolve_hierarchy(&class_file.name).await;

    let decoded: Vec<Option<Vec<Instruction>>> = class_file
        .methods
        .iter()
        .map(|method| {
            method
                .code
                .as_ref()
                .map(|code| decode_code(&code.code, &class_file.constants))
        })
        .collect();

    resolver
        .resolve_batch(&referenced_names(&class_file, &decoded))
        .await;

    let bodies: Vec<Option<MethodArtifacts>> = class_file
        .methods
        .iter()
        .zip(&decoded)
        .map(|(method, instructions)| match (&method.code, instructions) {
            (Some(code), Some(instructions)) => Some(reconstruct_method(
                &class_file.name,
                method,
                instructions,
                &code.exception_table,
            )),
            _ => None,
        })
        .collect();

    Ok(render_class(
        &class_file,
        &bodies,
        resolver.resolutions(),
        options,
    ))
}

/// Every class name the rendered output can mention: supertypes, member
/// types, and the classes referenced from method bodies.
fn referenced_names(
    class_file: &ClassFile,
    decoded: &[Option<Vec<Instruction>>],
) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    if let Some(superclass) = &class_file.superclass {
        names.insert(superclass.clone());
    }
    names.extend(class_file.interfaces.iter().cloned());
    for field in &class_file.fields {
        collect_type(&field.type_descriptor, &mut names);
    }
    for method in &class_file.methods {
        collect_descriptor(&method.parsed_type_descriptor, &mut names);
        if let Some(code) = &method.code {
            for entry in code.exception_table.entries() {
                if let Some(catch_class) = &entry.catch_class {
                    names.insert(catch_class.clone());
                }
            }
        }
    }
    for instructions in decoded.iter().flatten() {
        for instruction in instructions {
            if let Instruction::Known { operand, .. } = instruction {
                collect_operand(operand, &mut names);
            }
        }
    }
    names
}

fn collect_operand(operand: &Operand, names: &mut BTreeSet<String>) {
    match operand {
        Operand::Field(field) => {
            names.insert(field.class_name.clone());
            collect_type(&field.field_type, names);
        }
        Operand::Method(method) => {
            names.insert(method.class_name.clone());
            collect_descriptor(&method.descriptor, names);
        }
        Operand::Type(name)
        | Operand::Dimensions {
            class_name: name, ..
        } => collect_class_reference(name, names),
        Operand::Constant(LoadedConstant::Class(name)) => collect_class_reference(name, names),
        _ => {}
    }
}

/// `new`, `checkcast` and friends may reference an array class by its
/// descriptor form; only the element class needs resolution.
fn collect_class_reference(name: &str, names: &mut BTreeSet<String>) {
    if name.starts_with('[') {
        if let Ok(field_type) = FieldType::parse(name) {
            collect_type(&field_type, names);
        }
    } else {
        names.insert(name.to_string());
    }
}

fn collect_type(field_type: &FieldType, names: &mut BTreeSet<String>) {
    match field_type {
        FieldType::Base(_) => {}
        FieldType::Object(name) => {
            names.insert(name.clone());
        }
        FieldType::Array(component) => collect_type(component, names),
    }
}

fn collect_descriptor(descriptor: &MethodDescriptor, names: &mut BTreeSet<String>) {
    for parameter in &descriptor.parameters {
        collect_type(parameter, names);
    }
    if let Some(return_type) = &descriptor.return_type {
        collect_type(return_type, names);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::{
        class_environment::MapEnvironment, decompile_error::DecompileError, decompiler::decompile,
    };

    #[test_log::test(tokio::test)]
    async fn an_empty_name_is_not_found() {
        let environment = MapEnvironment::new(HashMap::new());

        let outcome = decompile("", environment).await;

        assert!(
            matches!(outcome, Err(DecompileError::ClassNotFound(name)) if name.is_empty()),
        );
    }
}
