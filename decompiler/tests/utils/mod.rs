//! Fixture support: a builder that assembles valid class files in memory,
//! and an environment that records every fetch the engine issues.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use decaf_decompiler::ClassEnvironment;

/// Access flags used by the fixtures.
pub mod flags {
    pub const PUBLIC: u16 = 0x0001;
    pub const STATIC: u16 = 0x0008;
    pub const SYNTHETIC: u16 = 0x1000;
}

/// Assembles a syntactically valid class file, one pool entry and member
/// at a time. Pool helpers return the 1-based index of the added entry,
/// so code arrays can embed references to them.
pub struct ClassFileBuilder {
    constants: Vec<Vec<u8>>,
    slots: u16,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
}

impl ClassFileBuilder {
    pub fn new(class_name: &str) -> ClassFileBuilder {
        let mut builder = ClassFileBuilder {
            constants: Vec::new(),
            slots: 0,
            access_flags: 0x0021, // public super
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        };
        builder.this_class = builder.class(class_name);
        builder.super_class = builder.class("java/lang/Object");
        builder
    }

    pub fn superclass(&mut self, class_name: &str) {
        self.super_class = self.class(class_name);
    }

    pub fn interface(&mut self, class_name: &str) {
        let index = self.class(class_name);
        self.interfaces.push(index);
    }

    pub fn utf8(&mut self, text: &str) -> u16 {
        let bytes = text.as_bytes();
        let mut entry = vec![1];
        push_u16(&mut entry, bytes.len() as u16);
        entry.extend_from_slice(bytes);
        self.add(entry)
    }

    pub fn class(&mut self, class_name: &str) -> u16 {
        let name = self.utf8(class_name);
        let mut entry = vec![7];
        push_u16(&mut entry, name);
        self.add(entry)
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        let mut entry = vec![3];
        entry.extend_from_slice(&value.to_be_bytes());
        self.add(entry)
    }

    pub fn field_ref(&mut self, class_name: &str, field_name: &str, descriptor: &str) -> u16 {
        let class = self.class(class_name);
        let name_and_type = self.name_and_type(field_name, descriptor);
        let mut entry = vec![9];
        push_u16(&mut entry, class);
        push_u16(&mut entry, name_and_type);
        self.add(entry)
    }

    pub fn method_ref(&mut self, class_name: &str, method_name: &str, descriptor: &str) -> u16 {
        let class = self.class(class_name);
        let name_and_type = self.name_and_type(method_name, descriptor);
        let mut entry = vec![10];
        push_u16(&mut entry, class);
        push_u16(&mut entry, name_and_type);
        self.add(entry)
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let mut entry = vec![12];
        push_u16(&mut entry, name);
        push_u16(&mut entry, descriptor);
        self.add(entry)
    }

    fn add(&mut self, entry: Vec<u8>) -> u16 {
        self.constants.push(entry);
        self.slots += 1;
        self.slots
    }

    pub fn field(&mut self, flags: u16, name: &str, descriptor: &str) {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let mut field = Vec::new();
        push_u16(&mut field, flags);
        push_u16(&mut field, name);
        push_u16(&mut field, descriptor);
        push_u16(&mut field, 0); // no attributes
        self.fields.push(field);
    }

    pub fn method(&mut self, flags: u16, name: &str, descriptor: &str, code: &[u8]) {
        self.method_with_handlers(flags, name, descriptor, code, &[]);
    }

    /// Handlers are (start, end, handler, catch class) tuples over code
    /// offsets; a `None` catch class catches everything.
    pub fn method_with_handlers(
        &mut self,
        flags: u16,
        name: &str,
        descriptor: &str,
        code: &[u8],
        handlers: &[(u16, u16, u16, Option<&str>)],
    ) {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let code_attribute_name = self.utf8("Code");
        let handler_classes: Vec<u16> = handlers
            .iter()
            .map(|(_, _, _, catch_class)| match *catch_class {
                Some(catch_class) => self.class(catch_class),
                None => 0,
            })
            .collect();

        let mut body = Vec::new();
        push_u16(&mut body, 4); // max_stack
        push_u16(&mut body, 4); // max_locals
        push_u32(&mut body, code.len() as u32);
        body.extend_from_slice(code);
        push_u16(&mut body, handlers.len() as u16);
        for ((start, end, handler, _), class_index) in handlers.iter().zip(handler_classes) {
            push_u16(&mut body, *start);
            push_u16(&mut body, *end);
            push_u16(&mut body, *handler);
            push_u16(&mut body, class_index);
        }
        push_u16(&mut body, 0); // no nested attributes

        let mut method = Vec::new();
        push_u16(&mut method, flags);
        push_u16(&mut method, name);
        push_u16(&mut method, descriptor);
        push_u16(&mut method, 1); // just the Code attribute
        push_u16(&mut method, code_attribute_name);
        push_u32(&mut method, body.len() as u32);
        method.extend_from_slice(&body);
        self.methods.push(method);
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push_u32(&mut out, 0xCAFEBABE);
        push_u16(&mut out, 0); // minor version
        push_u16(&mut out, 52); // major version, Java 8
        push_u16(&mut out, self.slots + 1);
        for entry in &self.constants {
            out.extend_from_slice(entry);
        }
        push_u16(&mut out, self.access_flags);
        push_u16(&mut out, self.this_class);
        push_u16(&mut out, self.super_class);
        push_u16(&mut out, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            push_u16(&mut out, *interface);
        }
        push_u16(&mut out, self.fields.len() as u16);
        for field in &self.fields {
            out.extend_from_slice(field);
        }
        push_u16(&mut out, self.methods.len() as u16);
        for method in &self.methods {
            out.extend_from_slice(method);
        }
        push_u16(&mut out, 0); // no class attributes
        out
    }
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// An archive over in-memory classes that keeps a log of every fetched
/// name, so tests can assert which classes the engine asked for.
#[derive(Clone)]
pub struct FixtureEnvironment {
    classes: Arc<HashMap<String, Vec<u8>>>,
    known: Arc<HashSet<String>>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl FixtureEnvironment {
    pub fn new(classes: HashMap<String, Vec<u8>>) -> FixtureEnvironment {
        let known = classes.keys().cloned().collect();
        FixtureEnvironment {
            classes: Arc::new(classes),
            known: Arc::new(known),
            fetched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Like `new`, but with extra names in the known set that have no
    /// bytes behind them, so fetching them comes back empty.
    pub fn promising(classes: HashMap<String, Vec<u8>>, phantom: &[&str]) -> FixtureEnvironment {
        let mut known: HashSet<String> = classes.keys().cloned().collect();
        known.extend(phantom.iter().map(|name| name.to_string()));
        FixtureEnvironment {
            classes: Arc::new(classes),
            known: Arc::new(known),
            fetched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn fetches_of(&self, class_name: &str) -> usize {
        self.fetched
            .lock()
            .unwrap()
            .iter()
            .filter(|name| name.as_str() == class_name)
            .count()
    }
}

#[async_trait]
impl ClassEnvironment for FixtureEnvironment {
    async fn fetch(&self, class_name: &str) -> Option<Vec<u8>> {
        self.fetched.lock().unwrap().push(class_name.to_string());
        self.classes.get(class_name).cloned()
    }

    fn is_known(&self, class_name: &str) -> bool {
        self.known.contains(class_name)
    }
}
