//! Primitive drawing operations.
//!
//! Every function returns a guard that draws the shape when dropped. Shapes are clipped to the
//! target view.

use std::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    prelude::*,
    primitives::{self, Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle},
};

use crate::{AsImageViewMut, Color, ImageViewMut};

/// Guard returned by [`line`][line()]; draws the line when dropped and allows customization.
pub struct DrawLine<'a> {
    image: ImageViewMut<'a>,
    start_x: i32,
    start_y: i32,
    end_x: i32,
    end_y: i32,
    color: Color,
    stroke_width: u32,
}

impl<'a> DrawLine<'a> {
    /// Sets the line's color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Sets the line's stroke width.
    ///
    /// By default, a stroke width of 1 is used.
    pub fn stroke_width(&mut self, width: u32) -> &mut Self {
        self.stroke_width = width;
        self
    }
}

impl<'a> Drop for DrawLine<'a> {
    fn drop(&mut self) {
        match Line::new(
            Point::new(self.start_x, self.start_y),
            Point::new(self.end_x, self.end_y),
        )
        .into_styled(PrimitiveStyle::with_stroke(self.color, self.stroke_width))
        .draw(&mut Target(self.image.reborrow()))
        {
            Ok(_) => {}
            Err(infallible) => match infallible {},
        }
    }
}

/// Guard returned by [`circle`]; draws the circle when dropped and allows customization.
pub struct DrawCircle<'a> {
    image: ImageViewMut<'a>,
    x: i32,
    y: i32,
    radius: u32,
    stroke_width: u32,
    color: Color,
    filled: bool,
}

impl<'a> DrawCircle<'a> {
    /// Sets the circle's color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Sets the circle's stroke width.
    ///
    /// By default, a stroke width of 1 is used.
    pub fn stroke_width(&mut self, width: u32) -> &mut Self {
        self.stroke_width = width;
        self
    }

    /// Fills the inside of the circle with its color.
    pub fn filled(&mut self) -> &mut Self {
        self.filled = true;
        self
    }
}

impl<'a> Drop for DrawCircle<'a> {
    fn drop(&mut self) {
        let circle = primitives::Circle::with_center(
            Point::new(self.x, self.y),
            self.radius * 2 + 1,
        );
        let mut style = PrimitiveStyleBuilder::new()
            .stroke_color(self.color)
            .stroke_width(self.stroke_width);
        if self.filled {
            style = style.fill_color(self.color);
        }
        match circle
            .into_styled(style.build())
            .draw(&mut Target(self.image.reborrow()))
        {
            Ok(_) => {}
            Err(infallible) => match infallible {},
        }
    }
}

/// Draws a line onto an image.
pub fn line<I: AsImageViewMut>(
    image: &mut I,
    start_x: i32,
    start_y: i32,
    end_x: i32,
    end_y: i32,
) -> DrawLine<'_> {
    DrawLine {
        image: image.as_view_mut(),
        start_x,
        start_y,
        end_x,
        end_y,
        color: Color::from_rgb8(0, 0, 255),
        stroke_width: 1,
    }
}

/// Draws a circle of the given radius, centered on `(x, y)`.
pub fn circle<'a, I: AsImageViewMut>(
    image: &'a mut I,
    x: i32,
    y: i32,
    radius: u32,
) -> DrawCircle<'a> {
    DrawCircle {
        image: image.as_view_mut(),
        x,
        y,
        radius,
        stroke_width: 1,
        color: Color::GREEN,
        filled: false,
    }
}

struct Target<'a>(ImageViewMut<'a>);

impl Dimensions for Target<'_> {
    fn bounding_box(&self) -> Rectangle {
        let (width, height) = (self.0.width(), self.0.height());

        Rectangle {
            top_left: Point { x: 0, y: 0 },
            size: Size { width, height },
        }
    }
}

impl DrawTarget for Target<'_> {
    type Color = Color;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = embedded_graphics::Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0
                && (point.x as u32) < self.0.width()
                && point.y >= 0
                && (point.y as u32) < self.0.height()
            {
                self.0.set(point.x as u32, point.y as u32, color);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Image, Resolution};

    use super::*;

    #[test]
    fn line_is_clipped() {
        let mut image = Image::filled(Resolution::new(8, 4), Color::WHITE);
        line(&mut image, -5, 1, 20, 1).color(Color::RED);

        for x in 0..8 {
            assert_eq!(image.get(x, 1), Color::RED);
            assert_eq!(image.get(x, 0), Color::WHITE);
            assert_eq!(image.get(x, 3), Color::WHITE);
        }
    }

    #[test]
    fn filled_circle() {
        let mut image = Image::filled(Resolution::new(9, 9), Color::WHITE);
        circle(&mut image, 4, 4, 2).color(Color::RED).filled();

        assert_eq!(image.get(4, 4), Color::RED);
        assert_eq!(image.get(4, 2), Color::RED);
        assert_eq!(image.get(0, 0), Color::WHITE);
        assert_eq!(image.get(8, 4), Color::WHITE);
    }

    #[test]
    fn outline_circle() {
        let mut image = Image::filled(Resolution::new(9, 9), Color::WHITE);
        circle(&mut image, 4, 4, 3).color(Color::BLUE);

        assert_eq!(image.get(4, 4), Color::WHITE);
        assert!((0..3).any(|y| image.get(4, y) == Color::BLUE));
    }
}
