//! Read-only lookup and classification over a decoded [`Header`].

use crate::error::{NetCdfError, NetCdfResult};
use crate::header::Header;
use crate::types::{Attribute, Dimension, Variable};

/// Metadata catalog borrowing an immutable header.
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'a> {
    header: &'a Header,
}

impl<'a> Catalog<'a> {
    pub fn new(header: &'a Header) -> Self {
        Self { header }
    }

    pub fn header(&self) -> &'a Header {
        self.header
    }

    // ===== Lookup =====

    pub fn dimension(&self, name: &str) -> Option<&'a Dimension> {
        self.header.dimensions.iter().find(|d| d.name == name)
    }

    pub fn dimension_index(&self, name: &str) -> Option<usize> {
        self.header.dimensions.iter().position(|d| d.name == name)
    }

    pub fn variable(&self, name: &str) -> Option<&'a Variable> {
        self.header.variables.iter().find(|v| v.name == name)
    }

    pub fn global_attribute(&self, name: &str) -> Option<&'a Attribute> {
        self.header.global_attributes.iter().find(|a| a.name == name)
    }

    /// Attribute of a variable. Missing variables and attributes are both `None`.
    pub fn variable_attribute(&self, variable: &str, name: &str) -> Option<&'a Attribute> {
        self.variable(variable)?.attribute(name)
    }

    /// Like [`Catalog::variable`] but a missing name is a lookup error.
    pub fn require_variable(&self, name: &str) -> NetCdfResult<&'a Variable> {
        self.variable(name)
            .ok_or_else(|| NetCdfError::lookup(format!("variable {:?} not found", name)))
    }

    pub fn require_dimension(&self, name: &str) -> NetCdfResult<&'a Dimension> {
        self.dimension(name)
            .ok_or_else(|| NetCdfError::lookup(format!("dimension {:?} not found", name)))
    }

    /// Dimensions of `var` in declared order.
    pub fn dimensions_of(&self, var: &Variable) -> Vec<&'a Dimension> {
        var.dim_ids
            .iter()
            .map(|&id| &self.header.dimensions[id])
            .collect()
    }

    pub fn dimension_names(&self, var: &Variable) -> Vec<&'a str> {
        self.dimensions_of(var)
            .into_iter()
            .map(|d| d.name.as_str())
            .collect()
    }

    // ===== Classification =====

    /// The unlimited dimension, if the file declares one.
    pub fn record_dimension(&self) -> Option<&'a Dimension> {
        self.header.dimensions.iter().find(|d| d.is_unlimited())
    }

    pub fn has_unlimited_dimension(&self) -> bool {
        self.record_dimension().is_some()
    }

    fn leading_dimension(&self, var: &Variable) -> Option<&'a Dimension> {
        var.dim_ids.first().map(|&id| &self.header.dimensions[id])
    }

    /// Whether the variable's data lives in the interleaved record section,
    /// i.e. its leading dimension is the unlimited one.
    pub fn is_stored_in_records(&self, var: &Variable) -> bool {
        self.leading_dimension(var)
            .map(|d| d.is_unlimited())
            .unwrap_or(false)
    }

    /// Leading dimension is unlimited and the variable is not that
    /// dimension's own coordinate variable.
    pub fn is_record_variable(&self, var: &Variable) -> bool {
        match self.leading_dimension(var) {
            Some(dim) => dim.is_unlimited() && dim.name != var.name,
            None => false,
        }
    }

    /// Exactly one dimension, sharing the variable's name.
    pub fn is_coordinate_variable(&self, var: &Variable) -> bool {
        var.dim_ids.len() == 1
            && self
                .leading_dimension(var)
                .map(|d| d.name == var.name)
                .unwrap_or(false)
    }

    pub fn record_variables(&self) -> Vec<&'a Variable> {
        self.header
            .variables
            .iter()
            .filter(|v| self.is_record_variable(v))
            .collect()
    }

    pub fn non_record_variables(&self) -> Vec<&'a Variable> {
        self.header
            .variables
            .iter()
            .filter(|v| !self.is_record_variable(v))
            .collect()
    }

    pub fn coordinate_variables(&self) -> Vec<&'a Variable> {
        self.header
            .variables
            .iter()
            .filter(|v| self.is_coordinate_variable(v))
            .collect()
    }

    /// The coordinate variable describing `dim_name`, if present.
    pub fn coordinate_variable(&self, dim_name: &str) -> Option<&'a Variable> {
        self.variable(dim_name)
            .filter(|v| self.is_coordinate_variable(v))
    }

    /// Variables laid out in the record section, in declared order.
    pub fn record_section_variables(&self) -> Vec<&'a Variable> {
        self.header
            .variables
            .iter()
            .filter(|v| self.is_stored_in_records(v))
            .collect()
    }
}
