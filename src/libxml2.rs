//! LibXML2 FFI Wrapper Module
//!
//! Safe wrappers around the handful of libxml2 calls the suite needs:
//!
//! - compiling an XSD from memory ([`LibXml2Wrapper::parse_schema_from_memory`])
//! - validating an in-memory document against it ([`LibXml2Wrapper::validate_memory`])
//! - reading an in-memory document into an owned element tree
//!   ([`LibXml2Wrapper::read_element_tree`])
//!
//! libxml2 does the encoding work: the rate service answers in `windows-1251`
//! and every string handed back to Rust is UTF-8.
//!
//! ## Thread Safety
//!
//! - **Schema parsing** is NOT thread-safe in libxml2 and is serialized behind
//!   [`SCHEMA_PARSE_LOCK`].
//! - **Document reading and validation** are safe for different documents, each
//!   call uses its own parser/validation context.
//! - **Compiled schemas** are read-only after parsing and shared through `Arc`.

use std::ffi::CStr;
use std::marker::PhantomData;
use std::ptr;
use std::sync::{Arc, Mutex, Once};

use libc::{c_char, c_int, c_void};

use crate::document::Element;
use crate::error::{LibXml2Error, LibXml2Result};

/// Global initialization flag for libxml2
static LIBXML2_INIT: Once = Once::new();

/// Serializes schema compilation
static SCHEMA_PARSE_LOCK: Mutex<()> = Mutex::new(());

const XML_ELEMENT_NODE: c_int = 1;
const XML_TEXT_NODE: c_int = 3;
const XML_CDATA_SECTION_NODE: c_int = 4;

const XML_PARSE_NOERROR: c_int = 1 << 5;
const XML_PARSE_NOWARNING: c_int = 1 << 6;
const XML_PARSE_NONET: c_int = 1 << 11;
const XML_PARSE_NOCDATA: c_int = 1 << 14;

/// Options used for every document read
const READ_OPTIONS: c_int =
    XML_PARSE_NONET | XML_PARSE_NOERROR | XML_PARSE_NOWARNING | XML_PARSE_NOCDATA;

// Opaque libxml2 structures
#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

/// Leading fields of libxml2's `xmlNode`. Only ever read through pointers
/// libxml2 hands out, never allocated on the Rust side.
#[allow(dead_code)]
#[repr(C)]
struct XmlNode {
    _private: *mut c_void,
    node_type: c_int,
    name: *const u8,
    children: *mut XmlNode,
    last: *mut XmlNode,
    parent: *mut XmlNode,
    next: *mut XmlNode,
    prev: *mut XmlNode,
    doc: *mut XmlDoc,
    ns: *mut c_void,
    content: *mut u8,
    properties: *mut XmlAttr,
}

/// Leading fields of libxml2's `xmlAttr`
#[allow(dead_code)]
#[repr(C)]
struct XmlAttr {
    _private: *mut c_void,
    node_type: c_int,
    name: *const u8,
    children: *mut XmlNode,
    last: *mut XmlNode,
    parent: *mut XmlNode,
    next: *mut XmlAttr,
}

#[repr(C)]
pub struct xmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *mut xmlError)>;

// External libxml2 FFI declarations
#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    fn xmlInitParser();
    fn xmlInitGlobals();

    // Schema parsing
    fn xmlSchemaNewMemParserCtxt(buffer: *const c_char, size: c_int) -> *mut XmlSchemaParserCtxt;
    fn xmlSchemaSetParserStructuredErrors(
        ctxt: *mut XmlSchemaParserCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    fn xmlSchemaFree(schema: *mut XmlSchema);

    // Schema validation
    fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    fn xmlSchemaValidateDoc(ctxt: *mut XmlSchemaValidCtxt, doc: *mut XmlDoc) -> c_int;

    // Document reading
    fn xmlReadMemory(
        buffer: *const c_char,
        size: c_int,
        url: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    fn xmlFreeDoc(doc: *mut XmlDoc);
    fn xmlDocGetRootElement(doc: *const XmlDoc) -> *mut XmlNode;

    // Error state
    fn xmlGetLastError() -> *const xmlError;
    fn xmlResetLastError();
}

/// Callback for libxml2 to report errors (structured)
unsafe extern "C" fn structured_error_callback(user_data: *mut c_void, error: *mut xmlError) {
    let errors = unsafe { &mut *(user_data as *mut Vec<String>) };

    if !error.is_null() {
        if let Some(message) = unsafe { error_message(&*error) } {
            errors.push(message);
        }
    }
}

/// Render a libxml2 error as `message (line N)`
unsafe fn error_message(error: &xmlError) -> Option<String> {
    if error.message.is_null() {
        return None;
    }
    let text = unsafe { CStr::from_ptr(error.message) }
        .to_string_lossy()
        .trim()
        .to_string();
    if error.line > 0 {
        Some(format!("{} (line {})", text, error.line))
    } else {
        Some(text)
    }
}

/// Last error libxml2 recorded on this thread, if any
fn last_error_message() -> Option<String> {
    unsafe {
        let error = xmlGetLastError();
        if error.is_null() {
            None
        } else {
            error_message(&*error)
        }
    }
}

/// Copy a libxml2 `xmlChar*` into an owned string
unsafe fn xml_string(ptr: *const u8) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let c_str = unsafe { CStr::from_ptr(ptr as *const c_char) };
    Some(c_str.to_string_lossy().into_owned())
}

fn buffer_len(data: &[u8]) -> LibXml2Result<c_int> {
    c_int::try_from(data.len()).map_err(|_| LibXml2Error::BufferTooLarge { size: data.len() })
}

/// Thread-safe wrapper for libxml2 schema pointer with proper resource management
#[derive(Debug)]
pub struct XmlSchemaPtr {
    inner: Arc<XmlSchemaInner>,
}

#[derive(Debug)]
struct XmlSchemaInner {
    ptr: *mut XmlSchema,
    _phantom: PhantomData<XmlSchema>,
}

// Safety: compiled xmlSchema structures are read-only during validation
unsafe impl Send for XmlSchemaInner {}
unsafe impl Sync for XmlSchemaInner {}

impl XmlSchemaPtr {
    /// # Safety
    ///
    /// `ptr` must come from `xmlSchemaParse` and must not be freed elsewhere.
    unsafe fn from_raw(ptr: *mut XmlSchema) -> Option<Self> {
        if ptr.is_null() {
            return None;
        }
        Some(XmlSchemaPtr {
            inner: Arc::new(XmlSchemaInner {
                ptr,
                _phantom: PhantomData,
            }),
        })
    }

    pub(crate) fn as_ptr(&self) -> *const XmlSchema {
        self.inner.ptr
    }

    /// Check if the schema pointer is valid (non-null)
    pub fn is_valid(&self) -> bool {
        !self.inner.ptr.is_null()
    }
}

impl Clone for XmlSchemaPtr {
    fn clone(&self) -> Self {
        XmlSchemaPtr {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for XmlSchemaInner {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                xmlSchemaFree(self.ptr);
            }
            self.ptr = ptr::null_mut();
        }
    }
}

/// Owned libxml2 document, freed on drop
struct XmlDocGuard(*mut XmlDoc);

impl XmlDocGuard {
    fn read(data: &[u8]) -> LibXml2Result<Self> {
        let size = buffer_len(data)?;
        unsafe {
            xmlResetLastError();
            let doc = xmlReadMemory(
                data.as_ptr() as *const c_char,
                size,
                ptr::null(),
                ptr::null(),
                READ_OPTIONS,
            );
            if doc.is_null() {
                return Err(LibXml2Error::DocumentParseFailed {
                    details: last_error_message()
                        .unwrap_or_else(|| "document is not well-formed XML".to_string()),
                });
            }
            Ok(XmlDocGuard(doc))
        }
    }
}

impl Drop for XmlDocGuard {
    fn drop(&mut self) {
        unsafe { xmlFreeDoc(self.0) }
    }
}

/// Validation result from libxml2
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Validation succeeded (return code 0)
    Valid,
    /// Validation failed with errors (return code > 0)
    Invalid {
        error_count: i32,
        errors: Vec<String>,
    },
    /// Internal error occurred (return code < 0)
    InternalError { code: i32 },
}

impl ValidationResult {
    /// Create ValidationResult from libxml2 return code and captured errors
    pub fn from_code(code: c_int, errors: Vec<String>) -> Self {
        match code {
            0 => ValidationResult::Valid,
            n if n > 0 => ValidationResult::Invalid {
                error_count: n,
                errors,
            },
            n => ValidationResult::InternalError { code: n },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

/// Safe access to the libxml2 functionality used by the suite
pub struct LibXml2Wrapper {
    _phantom: PhantomData<()>,
}

impl LibXml2Wrapper {
    /// Create a new wrapper, initializing libxml2 exactly once per process
    pub fn new() -> Self {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
            xmlInitGlobals();
        });

        LibXml2Wrapper {
            _phantom: PhantomData,
        }
    }

    /// Compile an XML schema from a memory buffer
    ///
    /// Calls are serialized process-wide; libxml2's schema parser is not
    /// reentrant.
    ///
    /// # Errors
    ///
    /// Returns `LibXml2Error::SchemaParseFailed` with the parser's messages if the
    /// schema cannot be compiled.
    pub fn parse_schema_from_memory(&self, schema_data: &[u8]) -> LibXml2Result<XmlSchemaPtr> {
        let size = buffer_len(schema_data)?;
        let _guard = SCHEMA_PARSE_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        unsafe {
            let parser_ctxt = xmlSchemaNewMemParserCtxt(schema_data.as_ptr() as *const c_char, size);
            if parser_ctxt.is_null() {
                return Err(LibXml2Error::MemoryAllocation);
            }

            let mut errors: Vec<String> = Vec::new();
            xmlSchemaSetParserStructuredErrors(
                parser_ctxt,
                Some(structured_error_callback),
                &mut errors as *mut Vec<String> as *mut c_void,
            );

            let schema_ptr = xmlSchemaParse(parser_ctxt);
            xmlSchemaFreeParserCtxt(parser_ctxt);

            XmlSchemaPtr::from_raw(schema_ptr).ok_or_else(|| LibXml2Error::SchemaParseFailed {
                details: if errors.is_empty() {
                    "libxml2 returned no schema".to_string()
                } else {
                    errors.join("; ")
                },
            })
        }
    }

    /// Validate an in-memory XML document against a compiled schema
    ///
    /// # Errors
    ///
    /// Returns `LibXml2Error::DocumentParseFailed` if the bytes are not
    /// well-formed, `LibXml2Error::InternalError` if libxml2 reports an
    /// internal failure.
    pub fn validate_memory(
        &self,
        schema: &XmlSchemaPtr,
        xml_content: &[u8],
    ) -> LibXml2Result<ValidationResult> {
        let doc = XmlDocGuard::read(xml_content)?;

        unsafe {
            let valid_ctxt = xmlSchemaNewValidCtxt(schema.as_ptr());
            if valid_ctxt.is_null() {
                return Err(LibXml2Error::ValidationContextCreationFailed);
            }

            let mut errors: Vec<String> = Vec::new();
            xmlSchemaSetValidStructuredErrors(
                valid_ctxt,
                Some(structured_error_callback),
                &mut errors as *mut Vec<String> as *mut c_void,
            );

            let result_code = xmlSchemaValidateDoc(valid_ctxt, doc.0);
            xmlSchemaFreeValidCtxt(valid_ctxt);

            match ValidationResult::from_code(result_code, errors) {
                ValidationResult::InternalError { code } => {
                    Err(LibXml2Error::InternalError { code })
                }
                result => Ok(result),
            }
        }
    }

    /// Read an in-memory XML document into an owned [`Element`] tree
    pub fn read_element_tree(&self, xml_content: &[u8]) -> LibXml2Result<Element> {
        let doc = XmlDocGuard::read(xml_content)?;

        unsafe {
            let root = xmlDocGetRootElement(doc.0);
            if root.is_null() {
                return Err(LibXml2Error::MissingRoot);
            }
            Ok(convert_element(&*root))
        }
    }
}

impl Default for LibXml2Wrapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy an element node and its element descendants into Rust-owned memory
unsafe fn convert_element(node: &XmlNode) -> Element {
    let tag = unsafe { xml_string(node.name) }.unwrap_or_default();

    let mut attributes = Vec::new();
    let mut attr = node.properties;
    while !attr.is_null() {
        let current = unsafe { &*attr };
        if let Some(name) = unsafe { xml_string(current.name) } {
            let value = unsafe { collect_text(current.children, false) }.unwrap_or_default();
            attributes.push((name, value));
        }
        attr = current.next;
    }

    let text = unsafe { collect_text(node.children, true) }.filter(|t| !t.is_empty());

    let mut children = Vec::new();
    let mut child = node.children;
    while !child.is_null() {
        let current = unsafe { &*child };
        if current.node_type == XML_ELEMENT_NODE {
            children.push(unsafe { convert_element(current) });
        }
        child = current.next;
    }

    Element::new(tag, attributes, text, children)
}

/// Concatenate sibling text nodes starting at `first`
///
/// With `stop_at_element` set, collection ends at the first element sibling so
/// the result is the character data leading the element's content.
unsafe fn collect_text(first: *mut XmlNode, stop_at_element: bool) -> Option<String> {
    let mut text: Option<String> = None;
    let mut node = first;
    while !node.is_null() {
        let current = unsafe { &*node };
        match current.node_type {
            XML_TEXT_NODE | XML_CDATA_SECTION_NODE => {
                if let Some(content) = unsafe { xml_string(current.content) } {
                    text.get_or_insert_with(String::new).push_str(&content);
                }
            }
            XML_ELEMENT_NODE if stop_at_element => break,
            _ => {}
        }
        node = current.next;
    }
    text
}
