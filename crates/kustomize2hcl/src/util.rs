use crate::placeholder::{Placeholders, Token};
use crate::visit;
use hcl::Expression;

#[derive(derive_new::new)]
pub(crate) struct PlaceholderSubstitutor<'p> {
    placeholders: &'p Placeholders,
}

impl<'p> visit::VisitMut<Expression> for PlaceholderSubstitutor<'p> {
    fn visit_mut(&mut self, expression: &mut Expression) {
        let Expression::String(value) = expression else {
            return;
        };

        let Some(token) = Token::unwrap_str(value) else {
            return;
        };

        let Some(placeholder) = self.placeholders.get(token) else {
            tracing::trace!(token, "no placeholder recorded, keeping literal");
            return;
        };

        *expression = placeholder.to_expression();
    }
}
